//! Variant store errors: lookup failures, file capture/apply failures.

use super::error_code::{self, SwitchboardErrorCode};

/// Errors raised by the variant store.
///
/// Not-found variants are always surfaced to the caller — silently defaulting
/// would corrupt baseline tracking. File I/O failures are fatal to the single
/// operation that hit them.
#[derive(Debug, thiserror::Error)]
pub enum VariantError {
    #[error("Variant not found: {variant_id}")]
    VariantNotFound { variant_id: String },

    #[error("Cannot read target file {target_file}: {message}")]
    TargetFileUnreadable { target_file: String, message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] super::StorageError),
}

impl SwitchboardErrorCode for VariantError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::VariantNotFound { .. } => error_code::VARIANT_NOT_FOUND,
            Self::TargetFileUnreadable { .. } => error_code::TARGET_FILE_UNREADABLE,
            Self::Io { .. } => error_code::VARIANT_IO_ERROR,
            Self::Storage(e) => e.error_code(),
        }
    }
}
