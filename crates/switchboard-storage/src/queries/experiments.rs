//! experiments table queries.

use rusqlite::{params, Connection, ToSql};

use switchboard_core::errors::StorageError;
use switchboard_core::models::experiment::{Experiment, ExperimentStatus, ExperimentType};

use super::{bad_enum, parse_timestamp};
use crate::sqe;

#[derive(Debug, Clone)]
struct ExperimentRecord {
    experiment_id: String,
    name: String,
    description: String,
    hypothesis: String,
    status: String,
    experiment_type: String,
    variants: String,
    test_ids: String,
    traffic_split: String,
    min_sample_size: u32,
    max_sample_size: u32,
    significance_threshold: f64,
    created_at: String,
    started_at: Option<String>,
    completed_at: Option<String>,
    winning_variant_id: Option<String>,
    conclusion: Option<String>,
}

const EXPERIMENT_COLUMNS: &str = "experiment_id, name, description, hypothesis, status, \
     experiment_type, variants, test_ids, traffic_split, min_sample_size, \
     max_sample_size, significance_threshold, created_at, started_at, \
     completed_at, winning_variant_id, conclusion";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExperimentRecord> {
    Ok(ExperimentRecord {
        experiment_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        hypothesis: row.get(3)?,
        status: row.get(4)?,
        experiment_type: row.get(5)?,
        variants: row.get(6)?,
        test_ids: row.get(7)?,
        traffic_split: row.get(8)?,
        min_sample_size: row.get(9)?,
        max_sample_size: row.get(10)?,
        significance_threshold: row.get(11)?,
        created_at: row.get(12)?,
        started_at: row.get(13)?,
        completed_at: row.get(14)?,
        winning_variant_id: row.get(15)?,
        conclusion: row.get(16)?,
    })
}

fn json_err(column: &str, e: serde_json::Error) -> StorageError {
    StorageError::SerializationError {
        message: format!("experiment {column}: {e}"),
    }
}

fn into_model(r: ExperimentRecord) -> Result<Experiment, StorageError> {
    Ok(Experiment {
        status: ExperimentStatus::parse(&r.status).ok_or_else(|| bad_enum("status", &r.status))?,
        experiment_type: ExperimentType::parse(&r.experiment_type)
            .ok_or_else(|| bad_enum("experiment_type", &r.experiment_type))?,
        variants: serde_json::from_str(&r.variants).map_err(|e| json_err("variants", e))?,
        test_ids: serde_json::from_str(&r.test_ids).map_err(|e| json_err("test_ids", e))?,
        traffic_split: serde_json::from_str(&r.traffic_split)
            .map_err(|e| json_err("traffic_split", e))?,
        created_at: parse_timestamp(&r.created_at)?,
        started_at: r.started_at.as_deref().map(parse_timestamp).transpose()?,
        completed_at: r.completed_at.as_deref().map(parse_timestamp).transpose()?,
        experiment_id: r.experiment_id,
        name: r.name,
        description: r.description,
        hypothesis: r.hypothesis,
        min_sample_size: r.min_sample_size,
        max_sample_size: r.max_sample_size,
        significance_threshold: r.significance_threshold,
        winning_variant_id: r.winning_variant_id,
        conclusion: r.conclusion,
    })
}

pub fn insert(conn: &Connection, experiment: &Experiment) -> Result<(), StorageError> {
    let variants = serde_json::to_string(&experiment.variants)
        .map_err(|e| json_err("variants", e))?;
    let test_ids = serde_json::to_string(&experiment.test_ids)
        .map_err(|e| json_err("test_ids", e))?;
    let traffic_split = serde_json::to_string(&experiment.traffic_split)
        .map_err(|e| json_err("traffic_split", e))?;

    conn.prepare_cached(
        "INSERT INTO experiments
         (experiment_id, name, description, hypothesis, status, experiment_type,
          variants, test_ids, traffic_split, min_sample_size, max_sample_size,
          significance_threshold, created_at, started_at, completed_at,
          winning_variant_id, conclusion)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
    )
    .map_err(sqe)?
    .execute(params![
        experiment.experiment_id,
        experiment.name,
        experiment.description,
        experiment.hypothesis,
        experiment.status.as_str(),
        experiment.experiment_type.as_str(),
        variants,
        test_ids,
        traffic_split,
        experiment.min_sample_size,
        experiment.max_sample_size,
        experiment.significance_threshold,
        experiment.created_at.to_rfc3339(),
        experiment.started_at.map(|t| t.to_rfc3339()),
        experiment.completed_at.map(|t| t.to_rfc3339()),
        experiment.winning_variant_id,
        experiment.conclusion,
    ])
    .map_err(sqe)?;
    Ok(())
}

pub fn get_by_id(
    conn: &Connection,
    experiment_id: &str,
) -> Result<Option<Experiment>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {EXPERIMENT_COLUMNS} FROM experiments WHERE experiment_id = ?1"
        ))
        .map_err(sqe)?;
    let record = stmt
        .query_row(params![experiment_id], map_row)
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(sqe(other)),
        })?;
    record.map(into_model).transpose()
}

pub fn list_by_status(
    conn: &Connection,
    status: ExperimentStatus,
) -> Result<Vec<Experiment>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {EXPERIMENT_COLUMNS} FROM experiments
             WHERE status = ?1 ORDER BY created_at"
        ))
        .map_err(sqe)?;
    let rows = stmt.query_map(params![status.as_str()], map_row).map_err(sqe)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(into_model(row.map_err(sqe)?)?);
    }
    Ok(result)
}

/// Guarded status transition: applies only if the current status is one of
/// `allowed_from`. The single UPDATE is the compare-and-set that serializes
/// concurrent transitions on the same experiment. Returns true if a row
/// changed.
pub fn transition_status(
    conn: &Connection,
    experiment_id: &str,
    allowed_from: &[ExperimentStatus],
    to: ExperimentStatus,
    now_rfc3339: &str,
) -> Result<bool, StorageError> {
    if allowed_from.is_empty() {
        return Ok(false);
    }

    let mark_started = i64::from(to == ExperimentStatus::Running);
    let mark_completed = i64::from(to.is_terminal());

    let placeholders: Vec<String> = (0..allowed_from.len())
        .map(|i| format!("?{}", i + 6))
        .collect();
    let sql = format!(
        "UPDATE experiments SET
             status = ?1,
             started_at = CASE WHEN ?2 = 1 THEN COALESCE(started_at, ?3) ELSE started_at END,
             completed_at = CASE WHEN ?4 = 1 THEN ?3 ELSE completed_at END
         WHERE experiment_id = ?5 AND status IN ({})",
        placeholders.join(", ")
    );

    let to_str = to.as_str();
    let mut params_vec: Vec<&dyn ToSql> = vec![
        &to_str,
        &mark_started,
        &now_rfc3339,
        &mark_completed,
        &experiment_id,
    ];
    let from_strs: Vec<&str> = allowed_from.iter().map(|s| s.as_str()).collect();
    for s in &from_strs {
        params_vec.push(s);
    }

    let changed = conn
        .prepare_cached(&sql)
        .map_err(sqe)?
        .execute(params_vec.as_slice())
        .map_err(sqe)?;
    Ok(changed > 0)
}

/// Record the winner and conclusion text.
pub fn set_outcome(
    conn: &Connection,
    experiment_id: &str,
    winning_variant_id: Option<&str>,
    conclusion: &str,
) -> Result<(), StorageError> {
    conn.prepare_cached(
        "UPDATE experiments SET winning_variant_id = ?2, conclusion = ?3
         WHERE experiment_id = ?1",
    )
    .map_err(sqe)?
    .execute(params![experiment_id, winning_variant_id, conclusion])
    .map_err(sqe)?;
    Ok(())
}
