//! variants table queries.

use rusqlite::{params, Connection};

use switchboard_core::errors::StorageError;
use switchboard_core::models::variant::{Variant, VariantOrigin, VariantType};

use super::{bad_enum, parse_timestamp};
use crate::sqe;

/// A variant row as stored (primitive column types).
#[derive(Debug, Clone)]
struct VariantRecord {
    variant_id: String,
    variant_type: String,
    target_file: String,
    name: String,
    description: String,
    content: String,
    content_hash: String,
    baseline_variant_id: Option<String>,
    source_fix_id: Option<String>,
    is_baseline: bool,
    created_at: String,
    created_by: String,
    metadata: Option<String>,
}

const VARIANT_COLUMNS: &str = "variant_id, variant_type, target_file, name, description, \
     content, content_hash, baseline_variant_id, source_fix_id, is_baseline, \
     created_at, created_by, metadata";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VariantRecord> {
    Ok(VariantRecord {
        variant_id: row.get(0)?,
        variant_type: row.get(1)?,
        target_file: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        content: row.get(5)?,
        content_hash: row.get(6)?,
        baseline_variant_id: row.get(7)?,
        source_fix_id: row.get(8)?,
        is_baseline: row.get(9)?,
        created_at: row.get(10)?,
        created_by: row.get(11)?,
        metadata: row.get(12)?,
    })
}

fn into_model(r: VariantRecord) -> Result<Variant, StorageError> {
    let metadata = match r.metadata {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
            StorageError::SerializationError {
                message: format!("variant metadata: {e}"),
            }
        })?),
        None => None,
    };
    Ok(Variant {
        variant_type: VariantType::parse(&r.variant_type)
            .ok_or_else(|| bad_enum("variant_type", &r.variant_type))?,
        created_by: VariantOrigin::parse(&r.created_by)
            .ok_or_else(|| bad_enum("created_by", &r.created_by))?,
        created_at: parse_timestamp(&r.created_at)?,
        variant_id: r.variant_id,
        target_file: r.target_file,
        name: r.name,
        description: r.description,
        content: r.content,
        content_hash: r.content_hash,
        baseline_variant_id: r.baseline_variant_id,
        source_fix_id: r.source_fix_id,
        is_baseline: r.is_baseline,
        metadata,
    })
}

/// Insert a variant, deduplicating on `(target_file, content_hash)`.
/// Returns the stored record — the existing one if the insert was a
/// duplicate. INSERT OR IGNORE + SELECT is one transactional unit on the
/// serialized connection.
pub fn insert_or_get(conn: &Connection, variant: &Variant) -> Result<Variant, StorageError> {
    let metadata = variant
        .metadata
        .as_ref()
        .map(|m| m.to_string());

    conn.prepare_cached(
        "INSERT OR IGNORE INTO variants
         (variant_id, variant_type, target_file, name, description, content,
          content_hash, baseline_variant_id, source_fix_id, is_baseline,
          created_at, created_by, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )
    .map_err(sqe)?
    .execute(params![
        variant.variant_id,
        variant.variant_type.as_str(),
        variant.target_file,
        variant.name,
        variant.description,
        variant.content,
        variant.content_hash,
        variant.baseline_variant_id,
        variant.source_fix_id,
        variant.is_baseline,
        variant.created_at.to_rfc3339(),
        variant.created_by.as_str(),
        metadata,
    ])
    .map_err(sqe)?;

    get_by_hash(conn, &variant.target_file, &variant.content_hash)?.ok_or_else(|| {
        StorageError::SqliteError {
            message: format!(
                "variant vanished after insert: {} @ {}",
                variant.target_file, variant.content_hash
            ),
        }
    })
}

pub fn get_by_id(conn: &Connection, variant_id: &str) -> Result<Option<Variant>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {VARIANT_COLUMNS} FROM variants WHERE variant_id = ?1"
        ))
        .map_err(sqe)?;
    let record = stmt
        .query_row(params![variant_id], map_row)
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(sqe(other)),
        })?;
    record.map(into_model).transpose()
}

pub fn get_by_hash(
    conn: &Connection,
    target_file: &str,
    content_hash: &str,
) -> Result<Option<Variant>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {VARIANT_COLUMNS} FROM variants
             WHERE target_file = ?1 AND content_hash = ?2"
        ))
        .map_err(sqe)?;
    let record = stmt
        .query_row(params![target_file, content_hash], map_row)
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(sqe(other)),
        })?;
    record.map(into_model).transpose()
}

pub fn get_baseline(conn: &Connection, target_file: &str) -> Result<Option<Variant>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {VARIANT_COLUMNS} FROM variants
             WHERE target_file = ?1 AND is_baseline = 1"
        ))
        .map_err(sqe)?;
    let record = stmt
        .query_row(params![target_file], map_row)
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(sqe(other)),
        })?;
    record.map(into_model).transpose()
}

/// Version history for a target file, oldest first.
pub fn list_by_target(conn: &Connection, target_file: &str) -> Result<Vec<Variant>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {VARIANT_COLUMNS} FROM variants
             WHERE target_file = ?1 ORDER BY created_at, variant_id"
        ))
        .map_err(sqe)?;
    let rows = stmt.query_map(params![target_file], map_row).map_err(sqe)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(into_model(row.map_err(sqe)?)?);
    }
    Ok(result)
}

/// Flip the baseline flag to `variant_id`, clearing every other variant of
/// the same target file. One transaction — the one-baseline-per-file
/// invariant holds at every commit point. Returns false if the variant
/// does not exist.
pub fn set_baseline(conn: &Connection, variant_id: &str) -> Result<bool, StorageError> {
    let target_file: Option<String> = conn
        .query_row(
            "SELECT target_file FROM variants WHERE variant_id = ?1",
            params![variant_id],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(sqe(other)),
        })?;

    let Some(target_file) = target_file else {
        return Ok(false);
    };

    conn.execute_batch("BEGIN IMMEDIATE").map_err(sqe)?;
    let result = conn
        .execute(
            "UPDATE variants SET is_baseline = 0 WHERE target_file = ?1",
            params![target_file],
        )
        .and_then(|_| {
            conn.execute(
                "UPDATE variants SET is_baseline = 1 WHERE variant_id = ?1",
                params![variant_id],
            )
        });

    match result {
        Ok(_) => {
            conn.execute_batch("COMMIT").map_err(sqe)?;
            Ok(true)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(sqe(e))
        }
    }
}
