//! Helpers for reading and writing SQLite columns.
//!
//! Money and rates are stored as decimal TEXT and nested structures as JSON
//! TEXT. Amount columns must parse. Optional rates and JSON columns are read
//! tolerantly: an unreadable value is logged and replaced by its default.

use log::warn;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::StorageError;
use royalty_core::utils::json_values::decimal_from_text;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite caps bound parameters per statement (SQLITE_MAX_VARIABLE_NUMBER,
/// often 999). 500 leaves room for the other parameters of a query.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits a slice into chunks small enough for one `IN (...)` clause.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

pub fn decimal_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn optional_decimal_to_text(value: Option<Decimal>) -> Option<String> {
    value.map(decimal_to_text)
}

/// Reads an amount column. An unreadable amount is an error rather than a
/// silent zero, since it would change every total built on it.
pub fn parse_decimal(raw: &str, column: &str) -> Result<Decimal, StorageError> {
    decimal_from_text(raw).ok_or_else(|| {
        StorageError::CorruptValue(format!("column {} holds '{}'", column, raw))
    })
}

/// Reads a nullable decimal column. Unreadable values become `None`.
pub fn parse_optional_decimal(raw: Option<&str>, column: &str) -> Option<Decimal> {
    let raw = raw?;
    let parsed = decimal_from_text(raw);
    if parsed.is_none() && !raw.trim().is_empty() {
        warn!("Unreadable decimal '{}' in column {}, ignoring it", raw, column);
    }
    parsed
}

pub fn to_json_text<T: Serialize>(value: &T) -> Result<String, StorageError> {
    Ok(serde_json::to_string(value)?)
}

/// Reads a JSON column, falling back to the type's default.
pub fn parse_json_or_default<T: DeserializeOwned + Default>(raw: &str, column: &str) -> T {
    if raw.trim().is_empty() {
        return T::default();
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Unreadable JSON in column {}: {}", column, e);
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    #[test]
    fn test_chunk_for_sqlite_splits_at_limit() {
        let items: Vec<i32> = (0..(SQLITE_MAX_PARAMS_CHUNK as i32 * 2 + 1)).collect();
        let chunks: Vec<_> = chunk_for_sqlite(&items).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 1);
    }

    #[test]
    fn test_decimal_columns() {
        assert_eq!(parse_decimal("12.50", "fee").unwrap(), dec!(12.5));
        assert_eq!(parse_decimal(" 3 ", "fee").unwrap(), dec!(3));
        assert_eq!(parse_decimal("1.5e2", "fee").unwrap(), dec!(150));
        assert!(matches!(
            parse_decimal("n/a", "fee_amount"),
            Err(StorageError::CorruptValue(msg)) if msg.contains("fee_amount")
        ));
        assert_eq!(parse_optional_decimal(Some("abc"), "rate"), None);
        assert_eq!(parse_optional_decimal(None, "rate"), None);
        assert_eq!(decimal_to_text(dec!(4.500)), "4.5");
    }

    #[test]
    fn test_json_columns_fall_back_to_default() {
        let parsed: Vec<String> = parse_json_or_default("[\"a\",\"b\"]", "territories");
        assert_eq!(parsed, vec!["a", "b"]);
        let broken: BTreeMap<String, String> = parse_json_or_default("{oops", "dimensions");
        assert!(broken.is_empty());
        let empty: Vec<String> = parse_json_or_default("", "territories");
        assert!(empty.is_empty());
    }
}
