//! Entry file codec: YAML front matter followed by free-text content.
//!
//! # Responsibility
//! - Decode one stored document into an `Entry` snapshot.
//! - Encode an `Entry` back without dropping header keys it does not model.
//!
//! # Invariants
//! - Entry ids come from the caller (file name), never from file contents.
//! - Unmodeled header keys and body bytes pass through re-encoding unchanged;
//!   only the header has to be UTF-8.
//!
//! # See also
//! - `model::entry::OriginalDocument`

use crate::model::entry::EntryValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod front_matter;

pub use front_matter::{decode_entry, encode_entry, encode_to_vec, READING_LIST_KEY};

pub type CodecResult<T> = Result<T, CodecError>;

/// Failures while decoding or encoding one entry document.
#[derive(Debug)]
pub enum CodecError {
    /// Input does not start with a `---` delimiter line.
    MissingFrontMatter,
    /// Opening delimiter has no matching closing delimiter.
    UnterminatedFrontMatter,
    /// Front matter uses a dialect other than YAML (e.g. TOML or JSON).
    UnsupportedDialect(&'static str),
    /// Front matter is not valid UTF-8.
    InvalidEncoding,
    /// Header parsed, but does not have the expected shape.
    InvalidHeader(String),
    /// Header is not parseable YAML, or could not be rendered.
    Yaml(serde_yaml::Error),
    /// The `reading-list` block has malformed fields (including dates).
    InvalidReadingList(serde_yaml::Error),
    /// Required values are missing.
    Validation(EntryValidationError),
    Io(std::io::Error),
}

impl CodecError {
    /// Returns whether this failure is about document shape rather than I/O
    /// or missing required values.
    pub fn is_format(&self) -> bool {
        !matches!(self, Self::Validation(_) | Self::Io(_))
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFrontMatter => write!(f, "document has no front matter delimiter"),
            Self::UnterminatedFrontMatter => write!(f, "front matter is not terminated"),
            Self::UnsupportedDialect(dialect) => {
                write!(f, "front matter is {dialect}, expected yaml")
            }
            Self::InvalidEncoding => write!(f, "front matter is not valid utf-8"),
            Self::InvalidHeader(message) => write!(f, "invalid front matter: {message}"),
            Self::Yaml(err) => write!(f, "invalid front matter yaml: {err}"),
            Self::InvalidReadingList(err) => write!(f, "invalid `reading-list` block: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Yaml(err) | Self::InvalidReadingList(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for CodecError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

impl From<std::io::Error> for CodecError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<EntryValidationError> for CodecError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}
