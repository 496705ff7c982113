//! Error taxonomy shared by cache refreshes and the entry manager.
//!
//! # Invariants
//! - Single-entry operations fail fast with one `EntryError`.
//! - Batch refreshes never stop at the first failure; they report every
//!   per-item failure through `AggregateError`.

use crate::codec::CodecError;
use crate::model::entry::{EntryId, EntryValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

pub type EntryResult<T> = Result<T, EntryError>;

/// Failure of one manager operation.
#[derive(Debug)]
pub enum EntryError {
    /// Stored document is malformed or not in the YAML dialect.
    Format { id: EntryId, source: CodecError },
    /// Missing title or a malformed identifier.
    Validation(EntryValidationError),
    /// No file backs the requested id.
    NotFound(EntryId),
    /// Storage operation failed; `id` is `None` for directory-level failures.
    Io { id: Option<EntryId>, source: io::Error },
    /// Per-item failures collected by a batch refresh.
    Aggregate(AggregateError),
}

impl EntryError {
    /// Classifies a storage error for `id`, mapping missing files to `NotFound`.
    pub(crate) fn storage(id: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(id.to_string())
        } else {
            Self::Io {
                id: Some(id.to_string()),
                source,
            }
        }
    }

    /// Classifies a codec error for `id`.
    pub(crate) fn codec(id: &str, source: CodecError) -> Self {
        match source {
            CodecError::Validation(err) => Self::Validation(err),
            CodecError::Io(err) => Self::storage(id, err),
            other => Self::Format {
                id: id.to_string(),
                source: other,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for EntryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format { id, source } => write!(f, "entry `{id}` is malformed: {source}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entry not found: `{id}`"),
            Self::Io {
                id: Some(id),
                source,
            } => write!(f, "storage error for entry `{id}`: {source}"),
            Self::Io { id: None, source } => write!(f, "storage error: {source}"),
            Self::Aggregate(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EntryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format { source, .. } => Some(source),
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Aggregate(err) => Some(err),
        }
    }
}

impl From<EntryValidationError> for EntryError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One failed item of a batch refresh.
#[derive(Debug)]
pub struct ItemFailure {
    /// Entry id, or `None` when enumerating storage failed.
    pub id: Option<EntryId>,
    pub error: EntryError,
}

/// Every per-item failure of one batch refresh.
#[derive(Debug, Default)]
pub struct AggregateError {
    failures: Vec<ItemFailure>,
}

impl AggregateError {
    pub fn new(failures: Vec<ItemFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Display for AggregateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} entry failure(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}", failure.error)?;
        }
        Ok(())
    }
}

impl Error for AggregateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures
            .first()
            .map(|failure| &failure.error as &(dyn Error + 'static))
    }
}
