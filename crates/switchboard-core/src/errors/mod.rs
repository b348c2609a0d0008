//! Error types for the Switchboard experimentation core.
//!
//! One enum per layer, each implementing [`error_code::SwitchboardErrorCode`]
//! so the dashboard can distinguish every failure by a stable string code.

pub mod error_code;
pub mod experiment_error;
pub mod storage_error;
pub mod variant_error;

pub use experiment_error::ExperimentError;
pub use storage_error::StorageError;
pub use variant_error::VariantError;
