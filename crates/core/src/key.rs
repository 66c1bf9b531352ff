//! Physical key layout
//!
//! Every record of a table lives under one shared prefix so that
//! lexicographic iteration over the KV engine visits a table's keys
//! contiguously:
//!
//! ```text
//! t$<table>|<key>
//! ```
//!
//! The layout is load-bearing: range reads (`all`, `since`, `before`)
//! seek by this prefix, and cursors recover the logical key by splitting
//! on the separator. Table names therefore must not contain the
//! separator; logical keys may.

use crate::error::{Error, Result};

/// Prefix marking a table-scoped key
pub const TABLE_PREFIX: &str = "t$";

/// Separator between the table component and the logical key
pub const KEY_SEPARATOR: char = '|';

/// Validate a table name
///
/// A table name must be non-empty and must not contain the key
/// separator, which would make storage keys ambiguous.
pub fn validate_table(table: &str) -> Result<()> {
    if table.is_empty() {
        return Err(Error::InvalidArgument("table name is empty".to_string()));
    }
    if table.contains(KEY_SEPARATOR) {
        return Err(Error::InvalidArgument(format!(
            "table name {table:?} contains {KEY_SEPARATOR:?}"
        )));
    }
    Ok(())
}

/// Physical key for a record: `t$<table>|<key>`
pub fn storage_key(table: &str, key: &str) -> Vec<u8> {
    format!("{TABLE_PREFIX}{table}{KEY_SEPARATOR}{key}").into_bytes()
}

/// Scan prefix covering every record of `table`: `t$<table>|`
///
/// The trailing separator is included so that `t$user` does not also
/// match `t$user_archive` keys.
pub fn scan_prefix(table: &str) -> Vec<u8> {
    format!("{TABLE_PREFIX}{table}{KEY_SEPARATOR}").into_bytes()
}

/// Recover `(table, key)` from a physical key
///
/// Splits at the first separator. Returns `InvalidArgument` when the
/// bytes are not a well-formed table-scoped key.
pub fn split_storage_key(raw: &[u8]) -> Result<(String, String)> {
    let s = std::str::from_utf8(raw)
        .map_err(|_| Error::InvalidArgument("storage key is not UTF-8".to_string()))?;
    let rest = s
        .strip_prefix(TABLE_PREFIX)
        .ok_or_else(|| Error::InvalidArgument(format!("storage key {s:?} has no table prefix")))?;
    match rest.split_once(KEY_SEPARATOR) {
        Some((table, key)) => Ok((table.to_string(), key.to_string())),
        None => Err(Error::InvalidArgument(format!(
            "storage key {s:?} has no separator"
        ))),
    }
}
