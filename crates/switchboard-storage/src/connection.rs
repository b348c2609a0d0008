//! `DatabaseManager` — owns the SQLite connection and serializes access.
//!
//! All operations in this core are synchronous request/response calls, so a
//! single mutex-guarded connection replaces a write-connection + read-pool
//! split. Callers go through `with_reader`/`with_writer`; no code outside
//! this crate touches a raw `Connection`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use switchboard_core::errors::StorageError;

use crate::migrations;
use crate::sqe;

/// Mutex-serialized SQLite connection with migrations applied.
pub struct DatabaseManager {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl DatabaseManager {
    /// Open a file-backed database. Applies pragmas (WAL, busy timeout)
    /// and runs pending migrations.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(sqe)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(sqe)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(sqe)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(sqe)?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Run a read-only closure against the connection.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let conn = self.conn.lock().map_err(|_| StorageError::DbBusy)?;
        f(&conn)
    }

    /// Run a writing closure against the connection.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let conn = self.conn.lock().map_err(|_| StorageError::DbBusy)?;
        f(&conn)
    }

    /// WAL checkpoint (no-op for in-memory databases).
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        if self.path.is_none() {
            return Ok(());
        }
        self.with_writer(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(sqe)
        })
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
