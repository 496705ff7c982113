//! Lax date handling for entry timestamps.
//!
//! # Invariants
//! - Dates are stored in UTC; an unset date is `None`, never a sentinel value.
//! - `parse_date(format_date(d)) == d` for every date `d`.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Short ISO 8601 date format (`2021-09-08`).
pub const SHORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp type used for `added`, `read` and `reviewed`.
pub type EntryDate = DateTime<Utc>;

/// Parses a full RFC 3339 timestamp or a short `YYYY-MM-DD` date.
///
/// Short dates resolve to midnight UTC.
pub fn parse_date(value: &str) -> Result<EntryDate, chrono::ParseError> {
    let trimmed = value.trim();
    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
        Err(_) => {
            let date = NaiveDate::parse_from_str(trimmed, SHORT_DATE_FORMAT)?;
            Ok(date.and_time(NaiveTime::MIN).and_utc())
        }
    }
}

/// Renders a date in the shortest form that parses back to the same value.
pub fn format_date(date: &EntryDate) -> String {
    if date.time() == NaiveTime::MIN {
        date.format(SHORT_DATE_FORMAT).to_string()
    } else {
        date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// Serde adapter for optional lax dates inside the `reading-list` block.
pub(crate) mod lax_date {
    use super::{format_date, parse_date, EntryDate};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<EntryDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&format_date(date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<EntryDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => parse_date(&value)
                .map(Some)
                .map_err(|err| D::Error::custom(format!("invalid date `{value}`: {err}"))),
        }
    }
}
