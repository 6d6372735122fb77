//! One `impl Database` block per collection. Row mapping helpers take a
//! column offset so the same mapper serves both plain and JOINed selects.

mod chat;
mod comments;
mod likes;
mod notifications;
mod plans;
mod posts;
mod progress;
mod relationships;
mod users;

use anyhow::Result;
use rusqlite::Row;
use rusqlite::types::Type;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Offset/limit for a zero-based page.
pub(crate) fn page_bounds(page: u32, size: u32) -> (i64, i64) {
    (size as i64, page as i64 * size as i64)
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decodes an embedded sub-document stored as JSON text.
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Unit-variant enums are stored as their serde name, e.g. `DAILY_UPDATE`.
pub(crate) fn enum_to_text<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) => match serde_json::to_value(v)? {
            serde_json::Value::String(s) => Ok(Some(s)),
            other => Err(anyhow::anyhow!("expected a unit enum, got {}", other)),
        },
    }
}

pub(crate) fn enum_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        serde_json::from_value(serde_json::Value::String(s))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
