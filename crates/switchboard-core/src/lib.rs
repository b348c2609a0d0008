//! # switchboard-core
//!
//! Foundation crate for the Switchboard experimentation core.
//! Defines the models, errors, config, storage traits, and telemetry setup.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod models;
pub mod telemetry;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::ExperimentConfig;
pub use errors::error_code::SwitchboardErrorCode;
pub use errors::{ExperimentError, StorageError, VariantError};
pub use models::assessment::{AbRecommendation, FixImpactAssessment, ImpactLevel};
pub use models::experiment::{
    Experiment, ExperimentStatus, ExperimentType, ExperimentVariant, VariantRole,
};
pub use models::fix::{FixLocation, GeneratedFix};
pub use models::run::{ExperimentRun, RunMetrics, TestOutcome};
pub use models::variant::{Variant, VariantOrigin, VariantType};
