//! YAML front matter parsing and rendering.

use super::{CodecError, CodecResult};
use crate::model::date::{lax_date, EntryDate};
use crate::model::entry::{Entry, EntryValidationError, OriginalDocument, Source};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::io::{Read, Write};

/// Header key holding the reading-list specific block.
pub const READING_LIST_KEY: &str = "reading-list";

const DELIMITER: &str = "---";
const DELIMITER_LINE: &str = "---\n";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const TITLE_KEY: &str = "title";
const SUMMARY_KEY: &str = "summary";
const BLOCK_KEYS: [&str; 6] = ["source", "author", "added", "read", "reviewed", "discovery"];

/// Modeled contents of the `reading-list` block.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ReadingListBlock {
    #[serde(skip_serializing_if = "Source::is_empty")]
    source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<Source>,
    #[serde(with = "lax_date", skip_serializing_if = "Option::is_none")]
    added: Option<EntryDate>,
    #[serde(with = "lax_date", skip_serializing_if = "Option::is_none")]
    read: Option<EntryDate>,
    #[serde(with = "lax_date", skip_serializing_if = "Option::is_none")]
    reviewed: Option<EntryDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    discovery: Option<Source>,
}

/// Decodes one stored document.
///
/// `id` is assigned as-is; it is the caller's storage key.
///
/// # Errors
/// - Format errors when the front matter is missing, unterminated, not YAML,
///   or has malformed `reading-list` fields.
/// - `Validation(EmptyTitle)` when `title` is missing or blank.
pub fn decode_entry<R: Read>(id: &str, mut reader: R) -> CodecResult<Entry> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    let (header_text, content) = split_front_matter(&raw)?;

    let header = match serde_yaml::from_str::<Value>(header_text)? {
        Value::Mapping(mapping) => mapping,
        Value::Null => Mapping::new(),
        _ => {
            return Err(CodecError::InvalidHeader(
                "front matter is not a key/value mapping".to_string(),
            ))
        }
    };

    let title = header_string(&header, TITLE_KEY)?
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| EntryValidationError::EmptyTitle(id.to_string()))?;
    let summary = header_string(&header, SUMMARY_KEY)?.unwrap_or_default();

    let block = match header.get(READING_LIST_KEY) {
        None | Some(Value::Null) => ReadingListBlock::default(),
        Some(value) => serde_yaml::from_value::<ReadingListBlock>(value.clone())
            .map_err(CodecError::InvalidReadingList)?,
    };

    let mut entry = Entry::new(id, title, block.source);
    entry.summary = summary;
    entry.author = block.author;
    entry.added = block.added;
    entry.read = block.read;
    entry.reviewed = block.reviewed;
    entry.discovery = block.discovery;
    Ok(entry.with_original(OriginalDocument::new(header, content.to_vec())))
}

/// Encodes `entry` as front matter plus the original body bytes.
///
/// Header keys are taken from the original document, then `title`,
/// `summary` and `reading-list` are overwritten. Returns bytes written.
///
/// # Errors
/// - `Validation(EmptyTitle)` when the entry has no title.
pub fn encode_entry<W: Write>(entry: &Entry, mut writer: W) -> CodecResult<usize> {
    if entry.title.trim().is_empty() {
        return Err(EntryValidationError::EmptyTitle(entry.id.clone()).into());
    }

    let header = merged_header(entry)?;
    let yaml = serde_yaml::to_string(&header)?;

    let mut written = 0;
    for chunk in [
        DELIMITER_LINE.as_bytes(),
        yaml.as_bytes(),
        DELIMITER_LINE.as_bytes(),
        entry.content_bytes(),
    ] {
        writer.write_all(chunk)?;
        written += chunk.len();
    }
    writer.flush()?;
    Ok(written)
}

/// Encodes `entry` into an in-memory buffer.
pub fn encode_to_vec(entry: &Entry) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    encode_entry(entry, &mut buffer)?;
    Ok(buffer)
}

fn merged_header(entry: &Entry) -> CodecResult<Mapping> {
    let original = &entry.original().header;
    let mut header = original.clone();
    header.insert(key(TITLE_KEY), Value::String(entry.title.clone()));
    header.insert(key(SUMMARY_KEY), Value::String(entry.summary.clone()));

    let block = ReadingListBlock {
        source: entry.source.clone(),
        author: entry.author.clone(),
        added: entry.added,
        read: entry.read,
        reviewed: entry.reviewed,
        discovery: entry.discovery.clone(),
    };
    let rendered = match serde_yaml::to_value(&block)? {
        Value::Mapping(mapping) => mapping,
        _ => Mapping::new(),
    };

    // Unknown keys inside the block are kept in place; modeled keys follow
    // the entry and are dropped when unset.
    let mut merged = Mapping::new();
    if let Some(Value::Mapping(previous)) = original.get(READING_LIST_KEY) {
        for (name, value) in previous {
            match name.as_str() {
                Some(known) if BLOCK_KEYS.contains(&known) => {
                    if let Some(current) = rendered.get(known) {
                        merged.insert(name.clone(), current.clone());
                    }
                }
                _ => {
                    merged.insert(name.clone(), value.clone());
                }
            }
        }
    }
    for name in BLOCK_KEYS {
        if let Some(current) = rendered.get(name) {
            if !merged.contains_key(name) {
                merged.insert(key(name), current.clone());
            }
        }
    }
    header.insert(key(READING_LIST_KEY), Value::Mapping(merged));
    Ok(header)
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn header_string(header: &Mapping, name: &str) -> CodecResult<Option<String>> {
    match header.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(Value::Number(value)) => Ok(Some(value.to_string())),
        Some(Value::Bool(value)) => Ok(Some(value.to_string())),
        Some(_) => Err(CodecError::InvalidHeader(format!(
            "`{name}` cannot be interpreted as a string"
        ))),
    }
}

/// Splits a document into header text and raw body bytes.
///
/// Only the header must be UTF-8; the body is carried through untouched.
fn split_front_matter(raw: &[u8]) -> CodecResult<(&str, &[u8])> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let (first, body) = split_line(raw);
    match trim_line_end(first) {
        line if line == DELIMITER.as_bytes() => {}
        b"+++" => return Err(CodecError::UnsupportedDialect("toml")),
        _ if raw.iter().find(|byte| !byte.is_ascii_whitespace()) == Some(&b'{') => {
            return Err(CodecError::UnsupportedDialect("json"))
        }
        _ => return Err(CodecError::MissingFrontMatter),
    }

    let mut rest = body;
    let mut header_len = 0;
    while !rest.is_empty() {
        let (line, tail) = split_line(rest);
        if trim_line_end(line) == DELIMITER.as_bytes() {
            let header = std::str::from_utf8(&body[..header_len])
                .map_err(|_| CodecError::InvalidEncoding)?;
            return Ok((header, tail));
        }
        header_len += rest.len() - tail.len();
        rest = tail;
    }
    Err(CodecError::UnterminatedFrontMatter)
}

fn split_line(raw: &[u8]) -> (&[u8], &[u8]) {
    match raw.iter().position(|byte| *byte == b'\n') {
        Some(index) => (&raw[..index], &raw[index + 1..]),
        None => (raw, &raw[raw.len()..]),
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(0, |index| index + 1);
    &line[..end]
}
