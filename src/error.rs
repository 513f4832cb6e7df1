//! Error types for schema management and loading.

use std::fmt;
use thiserror::Error;

/// Result type for loader operations
pub type LoadResult<T> = Result<T, LoadError>;

/// Why a single field of a source record was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Required field absent, null or blank
    Missing,
    /// REAL column value does not parse as a finite number
    NotANumber,
    /// INTEGER column value does not parse as an integer
    NotAnInteger,
    /// TEXT column value is a boolean, array or object
    NotText,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Missing => write!(f, "missing"),
            FailureReason::NotANumber => write!(f, "not a number"),
            FailureReason::NotAnInteger => write!(f, "not an integer"),
            FailureReason::NotText => write!(f, "not text"),
        }
    }
}

/// One record's field violates its column constraint
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{table} record {record_index}: field '{field}' is {reason}{}", display_value(.value))]
pub struct ValidationError {
    pub table: String,
    /// Zero-based position of the record in the batch
    pub record_index: usize,
    pub field: String,
    pub reason: FailureReason,
    /// Offending raw value, if there was one
    pub value: Option<String>,
}

fn display_value(value: &Option<String>) -> String {
    match value {
        Some(v) => format!(" (got {})", v),
        None => String::new(),
    }
}

/// Schema reset or creation failed
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column {column} in table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Failed to execute `{statement}`: {source}")]
    Ddl {
        statement: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Underlying store unavailable or a write failed
#[derive(Debug, Error)]
#[error("Storage failure while {operation}: {source}")]
pub struct StorageError {
    pub operation: String,
    #[source]
    pub source: rusqlite::Error,
}

/// Any failure surfaced by the loader
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Attach an operation description to a rusqlite result
pub(crate) trait StorageContext<T> {
    fn storage(self, operation: impl FnOnce() -> String) -> Result<T, StorageError>;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn storage(self, operation: impl FnOnce() -> String) -> Result<T, StorageError> {
        self.map_err(|source| StorageError {
            operation: operation(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message() {
        let err = ValidationError {
            table: "production".into(),
            record_index: 3,
            field: "yield".into(),
            reason: FailureReason::NotANumber,
            value: Some("\"abc\"".into()),
        };
        assert_eq!(
            err.to_string(),
            "production record 3: field 'yield' is not a number (got \"abc\")"
        );
    }

    #[test]
    fn test_missing_has_no_value_suffix() {
        let err = ValidationError {
            table: "production".into(),
            record_index: 0,
            field: "crop".into(),
            reason: FailureReason::Missing,
            value: None,
        };
        assert_eq!(err.to_string(), "production record 0: field 'crop' is missing");
    }
}
