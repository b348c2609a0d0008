//! v001: variants, experiments, experiment_runs.
//!
//! `UNIQUE(target_file, content_hash)` on variants enforces content
//! deduplication at the schema level — concurrent creates cannot
//! double-insert.

use rusqlite::Connection;

use switchboard_core::errors::StorageError;

use crate::sqe;

pub fn migrate(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS variants (
            variant_id          TEXT PRIMARY KEY,
            variant_type        TEXT NOT NULL,
            target_file         TEXT NOT NULL,
            name                TEXT NOT NULL,
            description         TEXT NOT NULL DEFAULT '',
            content             TEXT NOT NULL,
            content_hash        TEXT NOT NULL,
            baseline_variant_id TEXT,
            source_fix_id       TEXT,
            is_baseline         INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL,
            created_by          TEXT NOT NULL,
            metadata            TEXT,
            UNIQUE(target_file, content_hash)
        );

        CREATE INDEX IF NOT EXISTS idx_variants_target
            ON variants(target_file, created_at);
        CREATE INDEX IF NOT EXISTS idx_variants_baseline
            ON variants(target_file) WHERE is_baseline = 1;

        CREATE TABLE IF NOT EXISTS experiments (
            experiment_id          TEXT PRIMARY KEY,
            name                   TEXT NOT NULL,
            description            TEXT NOT NULL DEFAULT '',
            hypothesis             TEXT NOT NULL DEFAULT '',
            status                 TEXT NOT NULL,
            experiment_type        TEXT NOT NULL,
            variants               TEXT NOT NULL,
            test_ids               TEXT NOT NULL,
            traffic_split          TEXT NOT NULL,
            min_sample_size        INTEGER NOT NULL,
            max_sample_size        INTEGER NOT NULL,
            significance_threshold REAL NOT NULL,
            created_at             TEXT NOT NULL,
            started_at             TEXT,
            completed_at           TEXT,
            winning_variant_id     TEXT,
            conclusion             TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_experiments_status
            ON experiments(status);

        CREATE TABLE IF NOT EXISTS experiment_runs (
            run_id               TEXT PRIMARY KEY,
            experiment_id        TEXT NOT NULL REFERENCES experiments(experiment_id),
            test_id              TEXT NOT NULL,
            variant_id           TEXT NOT NULL,
            variant_role         TEXT NOT NULL,
            recorded_at          TEXT NOT NULL,
            passed               INTEGER NOT NULL,
            turn_count           INTEGER NOT NULL,
            duration_ms          INTEGER NOT NULL,
            goal_completion_rate REAL NOT NULL,
            constraint_violations INTEGER NOT NULL DEFAULT 0,
            error_occurred       INTEGER NOT NULL DEFAULT 0,
            goals_completed      INTEGER,
            goals_total          INTEGER,
            avg_turn_duration_ms REAL,
            issues_detected      INTEGER,
            error_count          INTEGER NOT NULL DEFAULT 0,
            tokens_used          INTEGER,
            cost_usd             REAL
        );

        CREATE INDEX IF NOT EXISTS idx_runs_experiment
            ON experiment_runs(experiment_id, recorded_at);
        CREATE INDEX IF NOT EXISTS idx_runs_variant
            ON experiment_runs(experiment_id, variant_id);
        ",
    )
    .map_err(sqe)
}
