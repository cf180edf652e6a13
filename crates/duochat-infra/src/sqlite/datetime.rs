//! Timestamp encoding shared by the SQLite repositories.
//!
//! Every stored timestamp is UTC RFC 3339 with a fixed six-digit fraction and
//! a `Z` suffix, so string comparison in SQL orders chronologically.

use chrono::{DateTime, SecondsFormat, Utc};

use duochat_types::error::RepositoryError;

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}
