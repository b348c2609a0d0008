//! Stable string codes for every error variant.

/// Storage-layer codes.
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const SQLITE_ERROR: &str = "STORAGE_SQLITE_ERROR";
pub const MIGRATION_FAILED: &str = "STORAGE_MIGRATION_FAILED";
pub const DB_BUSY: &str = "STORAGE_DB_BUSY";

/// Variant-layer codes.
pub const VARIANT_NOT_FOUND: &str = "VARIANT_NOT_FOUND";
pub const TARGET_FILE_UNREADABLE: &str = "VARIANT_TARGET_FILE_UNREADABLE";
pub const VARIANT_IO_ERROR: &str = "VARIANT_IO_ERROR";

/// Experiment-layer codes.
pub const EXPERIMENT_NOT_FOUND: &str = "EXPERIMENT_NOT_FOUND";
pub const INVALID_TRANSITION: &str = "EXPERIMENT_INVALID_TRANSITION";
pub const NOT_RUNNING: &str = "EXPERIMENT_NOT_RUNNING";
pub const MISSING_CONTROL: &str = "EXPERIMENT_MISSING_CONTROL";
pub const NO_TREATMENTS: &str = "EXPERIMENT_NO_TREATMENTS";
pub const INVALID_TRAFFIC_SPLIT: &str = "EXPERIMENT_INVALID_TRAFFIC_SPLIT";
pub const NO_WINNER: &str = "EXPERIMENT_NO_WINNER";

/// Maps every error variant to a stable, dashboard-distinguishable code.
pub trait SwitchboardErrorCode {
    /// The stable string code for this error.
    fn error_code(&self) -> &'static str;
}
