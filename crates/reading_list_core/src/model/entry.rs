//! Reading-list entry domain model.
//!
//! # Responsibility
//! - Define the entry snapshot shared by codec, cache and manager.
//! - Own identifier derivation (`gen_id`) and identifier validation.
//!
//! # Invariants
//! - `id` is derived once at creation and never read from file contents.
//! - `id` matches `^[a-z][a-z0-9-]+$` before it is used as a storage key.
//! - The original document snapshot is only replaced by the codec or by
//!   `Entry::adopt_original`, never edited field by field.

use crate::model::date::EntryDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Extension shared by every stored entry file.
pub const ENTRY_FILE_EXTENSION: &str = "md";

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9-]+$").expect("valid id regex"));
static URL_HOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://(?:[^/?#@]*@)?([^/?#:]+)").expect("valid url regex")
});

/// Stable entry identifier, e.g. a slug of the title.
pub type EntryId = String;

/// Domain validation failures for entry values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// Entry has no title; carries the entry id.
    EmptyTitle(EntryId),
    /// Identifier does not match the allowed slug shape.
    InvalidId(String),
    /// A caller-supplied date is neither RFC 3339 nor `YYYY-MM-DD`.
    InvalidDate { field: &'static str, value: String },
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle(id) => write!(f, "entry `{id}` must have a title"),
            Self::InvalidId(id) => write!(f, "invalid entry id: `{id}`"),
            Self::InvalidDate { field, value } => write!(f, "invalid {field} date: `{value}`"),
        }
    }
}

impl Error for EntryValidationError {}

/// Where an item (or its author, or its discovery) can be found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Human-readable label, e.g. a site name.
    #[serde(default)]
    pub text: String,
    /// Link target; may be empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

impl Source {
    pub fn new(text: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            uri: uri.into(),
        }
    }

    /// Returns whether both label and link are empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.uri.is_empty()
    }

    /// Returns the link when it is an absolute `scheme://host` URL.
    pub fn url(&self) -> Option<&str> {
        self.host().map(|_| self.uri.as_str())
    }

    /// Returns the host part of an absolute URL link.
    pub fn host(&self) -> Option<&str> {
        url_host(self.uri.trim())
    }
}

/// Builds a source when either label or link is non-empty.
///
/// A missing label falls back to the link host.
pub fn make_source(text: &str, uri: &str) -> Option<Source> {
    let text = text.trim();
    let uri = uri.trim();
    if text.is_empty() && uri.is_empty() {
        return None;
    }
    let label = if text.is_empty() {
        url_host(uri).unwrap_or_default()
    } else {
        text
    };
    Some(Source::new(label, uri))
}

pub(crate) fn url_host(value: &str) -> Option<&str> {
    URL_HOST_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|host| !host.is_empty())
}

/// Snapshot of a stored document exactly as last decoded.
///
/// Holds every header key (modeled or not) and the free-text body, so an
/// entry can be re-encoded without losing fields the model ignores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OriginalDocument {
    pub(crate) header: Mapping,
    pub(crate) content: Vec<u8>,
}

impl OriginalDocument {
    pub(crate) fn new(header: Mapping, content: Vec<u8>) -> Self {
        Self { header, content }
    }
}

/// One reading-list record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Storage key; the file is `<id>.md`.
    pub id: EntryId,
    /// Required display title (top-level `title` header key).
    pub title: String,
    /// Optional summary (top-level `summary` header key).
    pub summary: String,
    /// How the item can be found.
    pub source: Source,
    /// Who wrote the item; `None` means unknown.
    pub author: Option<Source>,
    /// When the item was queued.
    pub added: Option<EntryDate>,
    /// When the item was read; `None` means still in the queue.
    pub read: Option<EntryDate>,
    /// When commentary on the item was published.
    pub reviewed: Option<EntryDate>,
    /// How the item was found; rendered as "found via ...".
    pub discovery: Option<Source>,
    original: OriginalDocument,
}

impl Entry {
    /// Creates an entry that has never been stored.
    pub fn new(id: impl Into<EntryId>, title: impl Into<String>, source: Source) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: String::new(),
            source,
            author: None,
            added: None,
            read: None,
            reviewed: None,
            discovery: None,
            original: OriginalDocument::default(),
        }
    }

    pub(crate) fn with_original(mut self, original: OriginalDocument) -> Self {
        self.original = original;
        self
    }

    pub(crate) fn original(&self) -> &OriginalDocument {
        &self.original
    }

    /// Takes over the stored header and body of `stored`.
    ///
    /// Used when saving over an existing file so unknown keys survive.
    pub fn adopt_original(&mut self, stored: &Entry) {
        self.original = stored.original.clone();
    }

    /// Free-text body following the header, with invalid UTF-8 replaced.
    pub fn content(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.original.content)
    }

    /// Body bytes exactly as stored.
    pub fn content_bytes(&self) -> &[u8] {
        &self.original.content
    }

    /// All header keys as last read from storage.
    pub fn original_header(&self) -> &Mapping {
        &self.original.header
    }

    pub fn is_read(&self) -> bool {
        self.read.is_some()
    }

    /// Validates identifier shape and required title.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        validate_id(&self.id)?;
        if self.title.trim().is_empty() {
            return Err(EntryValidationError::EmptyTitle(self.id.clone()));
        }
        Ok(())
    }

    /// Storage file name for this entry.
    pub fn file_name(&self) -> String {
        entry_file_name(&self.id)
    }
}

/// Checks `id` against the slug shape accepted as a storage key.
pub fn validate_id(id: &str) -> Result<(), EntryValidationError> {
    if ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(EntryValidationError::InvalidId(id.to_string()))
    }
}

/// Maps an entry id to its file name.
pub fn entry_file_name(id: &str) -> String {
    format!("{id}.{ENTRY_FILE_EXTENSION}")
}

/// Derives a slug identifier from a title.
///
/// Lowercases, keeps ASCII letters and digits, and joins the remaining runs
/// with single hyphens. Distinct titles may collide.
pub fn gen_id(title: &str) -> EntryId {
    let spaced: String = title
        .trim()
        .chars()
        .map(|c| {
            let lower = c.to_ascii_lowercase();
            if lower.is_ascii_alphanumeric() {
                lower
            } else {
                ' '
            }
        })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join("-")
}
