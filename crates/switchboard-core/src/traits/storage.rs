//! Storage traits implemented by `switchboard-storage` and injected into the
//! variant store and orchestrator as `Arc<dyn …>`.
//!
//! The traits operate on the core model types directly. Degenerate lookups
//! return `Option`/`bool` — translating a miss into a domain error is the
//! service layer's job, so storage stays reusable across callers.

use crate::errors::StorageError;
use crate::models::experiment::{Experiment, ExperimentStatus};
use crate::models::run::ExperimentRun;
use crate::models::variant::Variant;

/// Persistence operations for variants.
pub trait IVariantStorage: Send + Sync {
    /// Insert a variant, deduplicating on `(target_file, content_hash)`.
    ///
    /// If a variant with the same target file and content hash already
    /// exists, the existing record is returned unchanged and nothing is
    /// inserted. The insert-then-select runs as one transactional unit so
    /// concurrent creates cannot double-insert.
    fn create_variant(&self, variant: &Variant) -> Result<Variant, StorageError>;

    fn get_variant(&self, variant_id: &str) -> Result<Option<Variant>, StorageError>;

    fn get_variant_by_hash(
        &self,
        target_file: &str,
        content_hash: &str,
    ) -> Result<Option<Variant>, StorageError>;

    /// The variant currently marked live for the target file, if any.
    fn get_baseline(&self, target_file: &str) -> Result<Option<Variant>, StorageError>;

    /// Append-only version history for a target file, oldest first.
    fn list_variants_by_target(&self, target_file: &str) -> Result<Vec<Variant>, StorageError>;

    /// Flip the baseline flag to the given variant, clearing it from every
    /// other variant of the same target file in the same transaction.
    /// Returns `false` if the variant does not exist.
    fn set_baseline(&self, variant_id: &str) -> Result<bool, StorageError>;
}

/// Persistence operations for experiments and their runs.
pub trait IExperimentStorage: Send + Sync {
    fn insert_experiment(&self, experiment: &Experiment) -> Result<(), StorageError>;

    fn get_experiment(&self, experiment_id: &str) -> Result<Option<Experiment>, StorageError>;

    fn list_experiments_by_status(
        &self,
        status: ExperimentStatus,
    ) -> Result<Vec<Experiment>, StorageError>;

    /// Compare-and-set status transition.
    ///
    /// Moves the experiment to `to` only if its current status is in
    /// `allowed_from`, as a single guarded UPDATE — concurrent transitions
    /// on the same experiment serialize on the row. Returns `true` when the
    /// transition applied. Also maintains `started_at` (first move to
    /// running) and `completed_at` (terminal states).
    fn transition_status(
        &self,
        experiment_id: &str,
        allowed_from: &[ExperimentStatus],
        to: ExperimentStatus,
    ) -> Result<bool, StorageError>;

    /// Record the conclusion of a completed or aborted experiment.
    fn set_outcome(
        &self,
        experiment_id: &str,
        winning_variant_id: Option<&str>,
        conclusion: &str,
    ) -> Result<(), StorageError>;

    fn insert_run(&self, run: &ExperimentRun) -> Result<(), StorageError>;

    /// All runs for an experiment, oldest first.
    fn get_runs(&self, experiment_id: &str) -> Result<Vec<ExperimentRun>, StorageError>;

    fn get_runs_by_variant(
        &self,
        experiment_id: &str,
        variant_id: &str,
    ) -> Result<Vec<ExperimentRun>, StorageError>;

    /// Per-variant run counts for an experiment.
    fn count_runs_by_variant(
        &self,
        experiment_id: &str,
    ) -> Result<Vec<(String, u32)>, StorageError>;
}
