//! Variant types: Variant, VariantType, VariantOrigin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored, immutable version of a prompt/tool/config artifact.
///
/// Variants are append-only: created once, never deleted. The only mutation
/// after creation is the baseline flag flip. Content is deduplicated by
/// `(target_file, content_hash)` — creating a variant with identical content
/// for the same target returns the existing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    /// Stable identifier (UUID v4).
    pub variant_id: String,
    pub variant_type: VariantType,
    /// Canonical artifact path this variant versions.
    pub target_file: String,
    pub name: String,
    pub description: String,
    /// Full artifact content (text or JSON blob).
    pub content: String,
    /// Blake3 hex digest of `content`, used for deduplication.
    pub content_hash: String,
    /// Parent variant this one was derived from, if any.
    pub baseline_variant_id: Option<String>,
    /// The candidate fix this variant materializes, if any.
    pub source_fix_id: Option<String>,
    /// Marks the currently-live version for its target file.
    /// At most one variant per target file has this set.
    pub is_baseline: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: VariantOrigin,
    /// Free-form metadata for the dashboard.
    pub metadata: Option<serde_json::Value>,
}

/// What kind of artifact a variant versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantType {
    Prompt,
    Tool,
    Config,
}

impl VariantType {
    /// Stable string form used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Tool => "tool",
            Self::Config => "config",
        }
    }

    /// Parse the stable string form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prompt" => Some(Self::Prompt),
            "tool" => Some(Self::Tool),
            "config" => Some(Self::Config),
            _ => None,
        }
    }
}

/// How a variant came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantOrigin {
    /// Captured or authored by an operator.
    Manual,
    /// Materialized from a candidate fix produced by the analysis process.
    AnalysisDerived,
    /// Generated by the system itself (e.g. baseline capture on first use).
    AutoGenerated,
}

impl VariantOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::AnalysisDerived => "analysis_derived",
            Self::AutoGenerated => "auto_generated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "analysis_derived" => Some(Self::AnalysisDerived),
            "auto_generated" => Some(Self::AutoGenerated),
            _ => None,
        }
    }
}

/// Input for creating a variant directly (manual capture or tests).
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub variant_type: VariantType,
    pub target_file: String,
    pub name: String,
    pub description: String,
    pub content: String,
    pub baseline_variant_id: Option<String>,
    pub source_fix_id: Option<String>,
    pub is_baseline: bool,
    pub created_by: VariantOrigin,
    pub metadata: Option<serde_json::Value>,
}
