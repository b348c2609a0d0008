//! experiment_runs table queries.

use rusqlite::{params, Connection};

use switchboard_core::errors::StorageError;
use switchboard_core::models::experiment::VariantRole;
use switchboard_core::models::run::{ExperimentRun, RunMetrics};

use super::{bad_enum, parse_timestamp};
use crate::sqe;

#[derive(Debug, Clone)]
struct RunRecord {
    run_id: String,
    experiment_id: String,
    test_id: String,
    variant_id: String,
    variant_role: String,
    recorded_at: String,
    passed: bool,
    turn_count: u32,
    duration_ms: u64,
    goal_completion_rate: f64,
    constraint_violations: u32,
    error_occurred: bool,
    goals_completed: Option<u32>,
    goals_total: Option<u32>,
    avg_turn_duration_ms: Option<f64>,
    issues_detected: Option<u32>,
    error_count: u32,
    tokens_used: Option<u64>,
    cost_usd: Option<f64>,
}

const RUN_COLUMNS: &str = "run_id, experiment_id, test_id, variant_id, variant_role, \
     recorded_at, passed, turn_count, duration_ms, goal_completion_rate, \
     constraint_violations, error_occurred, goals_completed, goals_total, \
     avg_turn_duration_ms, issues_detected, error_count, tokens_used, cost_usd";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        run_id: row.get(0)?,
        experiment_id: row.get(1)?,
        test_id: row.get(2)?,
        variant_id: row.get(3)?,
        variant_role: row.get(4)?,
        recorded_at: row.get(5)?,
        passed: row.get(6)?,
        turn_count: row.get(7)?,
        duration_ms: row.get(8)?,
        goal_completion_rate: row.get(9)?,
        constraint_violations: row.get(10)?,
        error_occurred: row.get(11)?,
        goals_completed: row.get(12)?,
        goals_total: row.get(13)?,
        avg_turn_duration_ms: row.get(14)?,
        issues_detected: row.get(15)?,
        error_count: row.get(16)?,
        tokens_used: row.get(17)?,
        cost_usd: row.get(18)?,
    })
}

fn into_model(r: RunRecord) -> Result<ExperimentRun, StorageError> {
    Ok(ExperimentRun {
        variant_role: VariantRole::parse(&r.variant_role)
            .ok_or_else(|| bad_enum("variant_role", &r.variant_role))?,
        recorded_at: parse_timestamp(&r.recorded_at)?,
        experiment_id: r.experiment_id,
        run_id: r.run_id,
        test_id: r.test_id,
        variant_id: r.variant_id,
        passed: r.passed,
        turn_count: r.turn_count,
        duration_ms: r.duration_ms,
        goal_completion_rate: r.goal_completion_rate,
        constraint_violations: r.constraint_violations,
        error_occurred: r.error_occurred,
        metrics: RunMetrics {
            goals_completed: r.goals_completed,
            goals_total: r.goals_total,
            avg_turn_duration_ms: r.avg_turn_duration_ms,
            issues_detected: r.issues_detected,
            error_count: r.error_count,
            tokens_used: r.tokens_used,
            cost_usd: r.cost_usd,
        },
    })
}

pub fn insert(conn: &Connection, run: &ExperimentRun) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO experiment_runs
         (run_id, experiment_id, test_id, variant_id, variant_role, recorded_at,
          passed, turn_count, duration_ms, goal_completion_rate,
          constraint_violations, error_occurred, goals_completed, goals_total,
          avg_turn_duration_ms, issues_detected, error_count, tokens_used, cost_usd)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                 ?15, ?16, ?17, ?18, ?19)",
    )
    .map_err(sqe)?
    .execute(params![
        run.run_id,
        run.experiment_id,
        run.test_id,
        run.variant_id,
        run.variant_role.as_str(),
        run.recorded_at.to_rfc3339(),
        run.passed,
        run.turn_count,
        run.duration_ms,
        run.goal_completion_rate,
        run.constraint_violations,
        run.error_occurred,
        run.metrics.goals_completed,
        run.metrics.goals_total,
        run.metrics.avg_turn_duration_ms,
        run.metrics.issues_detected,
        run.metrics.error_count,
        run.metrics.tokens_used,
        run.metrics.cost_usd,
    ])
    .map_err(sqe)?;
    Ok(())
}

/// All runs for an experiment, oldest first.
pub fn get_by_experiment(
    conn: &Connection,
    experiment_id: &str,
) -> Result<Vec<ExperimentRun>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {RUN_COLUMNS} FROM experiment_runs
             WHERE experiment_id = ?1 ORDER BY recorded_at, run_id"
        ))
        .map_err(sqe)?;
    let rows = stmt.query_map(params![experiment_id], map_row).map_err(sqe)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(into_model(row.map_err(sqe)?)?);
    }
    Ok(result)
}

pub fn get_by_variant(
    conn: &Connection,
    experiment_id: &str,
    variant_id: &str,
) -> Result<Vec<ExperimentRun>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {RUN_COLUMNS} FROM experiment_runs
             WHERE experiment_id = ?1 AND variant_id = ?2
             ORDER BY recorded_at, run_id"
        ))
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![experiment_id, variant_id], map_row)
        .map_err(sqe)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(into_model(row.map_err(sqe)?)?);
    }
    Ok(result)
}

/// Per-variant run counts.
pub fn count_by_variant(
    conn: &Connection,
    experiment_id: &str,
) -> Result<Vec<(String, u32)>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT variant_id, COUNT(*) FROM experiment_runs
             WHERE experiment_id = ?1 GROUP BY variant_id ORDER BY variant_id",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![experiment_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })
        .map_err(sqe)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(sqe)?);
    }
    Ok(result)
}
