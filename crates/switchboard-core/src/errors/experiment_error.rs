//! Experiment orchestration errors: unknown experiments, invalid state
//! transitions, malformed variant sets.

use super::error_code::{self, SwitchboardErrorCode};
use crate::models::experiment::ExperimentStatus;

/// Errors raised by the experiment orchestrator.
///
/// Invalid transitions carry the current status so the caller can re-check
/// state before retrying. "No significant difference yet" is not an error —
/// it is a first-class recommendation from the statistics engine.
#[derive(Debug, thiserror::Error)]
pub enum ExperimentError {
    #[error("Experiment not found: {experiment_id}")]
    ExperimentNotFound { experiment_id: String },

    #[error("Cannot {action} experiment {experiment_id}: status is {current:?}")]
    InvalidTransition {
        experiment_id: String,
        action: &'static str,
        current: ExperimentStatus,
    },

    #[error("Experiment {experiment_id} is not running (status: {current:?})")]
    NotRunning {
        experiment_id: String,
        current: ExperimentStatus,
    },

    #[error("Experiment must have exactly one control variant, got {count}")]
    MissingControl { count: usize },

    #[error("Experiment must have at least one treatment variant")]
    NoTreatments,

    #[error("Traffic split weights must sum to 100, got {total}")]
    InvalidTrafficSplit { total: u32 },

    #[error("Experiment {experiment_id} has no winning variant to adopt")]
    NoWinner { experiment_id: String },

    #[error("Variant error: {0}")]
    Variant(#[from] super::VariantError),

    #[error("Storage error: {0}")]
    Storage(#[from] super::StorageError),
}

impl SwitchboardErrorCode for ExperimentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ExperimentNotFound { .. } => error_code::EXPERIMENT_NOT_FOUND,
            Self::InvalidTransition { .. } => error_code::INVALID_TRANSITION,
            Self::NotRunning { .. } => error_code::NOT_RUNNING,
            Self::MissingControl { .. } => error_code::MISSING_CONTROL,
            Self::NoTreatments => error_code::NO_TREATMENTS,
            Self::InvalidTrafficSplit { .. } => error_code::INVALID_TRAFFIC_SPLIT,
            Self::NoWinner { .. } => error_code::NO_WINNER,
            Self::Variant(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
        }
    }
}
