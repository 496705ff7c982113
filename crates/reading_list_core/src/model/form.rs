//! Construction of entries from validated form-like input.
//!
//! # Responsibility
//! - Map "save" and "share" form fields onto a new `Entry`.
//! - Derive a slug id for new entries and fill defaults for shared links.
//!
//! # Invariants
//! - An explicit `id` always wins over the derived slug.
//! - `added` defaults to the supplied `now` unless the form carries one.

use crate::model::date::{parse_date, EntryDate};
use crate::model::entry::{gen_id, make_source, url_host, Entry, EntryValidationError, Source};

/// Raw field values as submitted by a save/share form.
///
/// Empty strings mean "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub source_url: String,
    /// Free `text` field of a share target; some platforms put the URL here.
    pub text: String,
    pub author: String,
    pub author_url: String,
    pub discovery: String,
    pub discovery_url: String,
    pub added: String,
    pub read: String,
    pub reviewed: String,
}

impl Entry {
    /// Builds an entry from form input.
    ///
    /// # Errors
    /// - `InvalidDate` when `added`, `read` or `reviewed` is set but unparsable.
    pub fn from_form(form: &EntryForm, now: EntryDate) -> Result<Entry, EntryValidationError> {
        let title = form.title.trim();
        let id = match form.id.trim() {
            "" => gen_id(title),
            explicit => explicit.to_string(),
        };

        let mut source_url = form.source_url.trim().to_string();
        if source_url.is_empty() && url_host(form.text.trim()).is_some() {
            source_url = form.text.trim().to_string();
        }
        let mut source_text = form.source.trim().to_string();
        if source_text.is_empty() {
            source_text = url_host(&source_url).unwrap_or_default().to_string();
        }

        let mut entry = Entry::new(id, title, Source::new(source_text, source_url));
        entry.summary = form.summary.trim().to_string();
        entry.author = make_source(&form.author, &form.author_url);
        entry.discovery = make_source(&form.discovery, &form.discovery_url);
        entry.added = parse_form_date("added", &form.added)?.or(Some(now));
        entry.read = parse_form_date("read", &form.read)?;
        entry.reviewed = parse_form_date("reviewed", &form.reviewed)?;
        Ok(entry)
    }
}

fn parse_form_date(
    field: &'static str,
    value: &str,
) -> Result<Option<EntryDate>, EntryValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_date(trimmed)
        .map(Some)
        .map_err(|_| EntryValidationError::InvalidDate {
            field,
            value: trimmed.to_string(),
        })
}
