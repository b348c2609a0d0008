//! Query modules — one per table, prepared statements, explicit row mapping.

pub mod experiments;
pub mod runs;
pub mod variants;

use chrono::{DateTime, Utc};
use switchboard_core::errors::StorageError;

/// Parse an RFC 3339 timestamp column.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::SerializationError {
            message: format!("invalid timestamp '{raw}': {e}"),
        })
}

/// Error for an enum column holding an unknown value.
pub(crate) fn bad_enum(column: &str, value: &str) -> StorageError {
    StorageError::SerializationError {
        message: format!("unknown {column} value '{value}'"),
    }
}
