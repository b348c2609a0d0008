//! # switchboard-storage
//!
//! SQLite persistence layer for the Switchboard experimentation core.
//! WAL mode, mutex-serialized connection, forward-only schema migrations.
//! Implements the `IVariantStorage` and `IExperimentStorage` traits from
//! `switchboard-core`.

pub mod connection;
pub mod engine;
pub mod migrations;
pub mod queries;

pub use connection::DatabaseManager;
pub use engine::SwitchboardStorageEngine;

use switchboard_core::errors::StorageError;

/// Helper to convert a SQLite error message into a `StorageError`.
pub(crate) fn sqe(e: impl std::fmt::Display) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}
