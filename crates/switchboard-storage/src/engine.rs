//! `SwitchboardStorageEngine` — the `IVariantStorage`/`IExperimentStorage`
//! implementation backed by `DatabaseManager`.

use std::path::Path;

use chrono::Utc;
use tracing::debug;

use switchboard_core::errors::StorageError;
use switchboard_core::models::experiment::{Experiment, ExperimentStatus};
use switchboard_core::models::run::ExperimentRun;
use switchboard_core::models::variant::Variant;
use switchboard_core::traits::{IExperimentStorage, IVariantStorage};

use crate::connection::DatabaseManager;
use crate::queries;

/// SQLite-backed storage engine. Cheap to share behind an `Arc`.
pub struct SwitchboardStorageEngine {
    db: DatabaseManager,
}

impl SwitchboardStorageEngine {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let db = DatabaseManager::open(path)?;
        debug!(path = %path.display(), "storage engine opened");
        Ok(Self { db })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open_in_memory()?,
        })
    }

    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.db.checkpoint()
    }
}

impl IVariantStorage for SwitchboardStorageEngine {
    fn create_variant(&self, variant: &Variant) -> Result<Variant, StorageError> {
        self.db
            .with_writer(|conn| queries::variants::insert_or_get(conn, variant))
    }

    fn get_variant(&self, variant_id: &str) -> Result<Option<Variant>, StorageError> {
        self.db
            .with_reader(|conn| queries::variants::get_by_id(conn, variant_id))
    }

    fn get_variant_by_hash(
        &self,
        target_file: &str,
        content_hash: &str,
    ) -> Result<Option<Variant>, StorageError> {
        self.db
            .with_reader(|conn| queries::variants::get_by_hash(conn, target_file, content_hash))
    }

    fn get_baseline(&self, target_file: &str) -> Result<Option<Variant>, StorageError> {
        self.db
            .with_reader(|conn| queries::variants::get_baseline(conn, target_file))
    }

    fn list_variants_by_target(&self, target_file: &str) -> Result<Vec<Variant>, StorageError> {
        self.db
            .with_reader(|conn| queries::variants::list_by_target(conn, target_file))
    }

    fn set_baseline(&self, variant_id: &str) -> Result<bool, StorageError> {
        self.db
            .with_writer(|conn| queries::variants::set_baseline(conn, variant_id))
    }
}

impl IExperimentStorage for SwitchboardStorageEngine {
    fn insert_experiment(&self, experiment: &Experiment) -> Result<(), StorageError> {
        self.db
            .with_writer(|conn| queries::experiments::insert(conn, experiment))
    }

    fn get_experiment(&self, experiment_id: &str) -> Result<Option<Experiment>, StorageError> {
        self.db
            .with_reader(|conn| queries::experiments::get_by_id(conn, experiment_id))
    }

    fn list_experiments_by_status(
        &self,
        status: ExperimentStatus,
    ) -> Result<Vec<Experiment>, StorageError> {
        self.db
            .with_reader(|conn| queries::experiments::list_by_status(conn, status))
    }

    fn transition_status(
        &self,
        experiment_id: &str,
        allowed_from: &[ExperimentStatus],
        to: ExperimentStatus,
    ) -> Result<bool, StorageError> {
        let now = Utc::now().to_rfc3339();
        self.db.with_writer(|conn| {
            queries::experiments::transition_status(conn, experiment_id, allowed_from, to, &now)
        })
    }

    fn set_outcome(
        &self,
        experiment_id: &str,
        winning_variant_id: Option<&str>,
        conclusion: &str,
    ) -> Result<(), StorageError> {
        self.db.with_writer(|conn| {
            queries::experiments::set_outcome(conn, experiment_id, winning_variant_id, conclusion)
        })
    }

    fn insert_run(&self, run: &ExperimentRun) -> Result<(), StorageError> {
        self.db
            .with_writer(|conn| queries::runs::insert(conn, run))
    }

    fn get_runs(&self, experiment_id: &str) -> Result<Vec<ExperimentRun>, StorageError> {
        self.db
            .with_reader(|conn| queries::runs::get_by_experiment(conn, experiment_id))
    }

    fn get_runs_by_variant(
        &self,
        experiment_id: &str,
        variant_id: &str,
    ) -> Result<Vec<ExperimentRun>, StorageError> {
        self.db
            .with_reader(|conn| queries::runs::get_by_variant(conn, experiment_id, variant_id))
    }

    fn count_runs_by_variant(
        &self,
        experiment_id: &str,
    ) -> Result<Vec<(String, u32)>, StorageError> {
        self.db
            .with_reader(|conn| queries::runs::count_by_variant(conn, experiment_id))
    }
}
