//! Experiment types: Experiment, ExperimentStatus, ExperimentType,
//! ExperimentVariant, VariantRole.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single control-vs-treatment hypothesis test.
///
/// Invariants: exactly one control variant, at least one treatment,
/// traffic-split weights sum to 100, and status moves only through the
/// transitions [`ExperimentStatus`] allows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub name: String,
    pub description: String,
    /// Free-text hypothesis this experiment tests.
    pub hypothesis: String,
    pub status: ExperimentStatus,
    pub experiment_type: ExperimentType,
    /// Ordered variant arms. Index 0 is the control by construction.
    pub variants: Vec<ExperimentVariant>,
    /// Scope of test scenarios this experiment applies to.
    pub test_ids: Vec<String>,
    /// variant_id → weight. Weights sum to 100.
    /// BTreeMap keeps serialization order stable.
    pub traffic_split: BTreeMap<String, u32>,
    pub min_sample_size: u32,
    pub max_sample_size: u32,
    /// Significance threshold α (default 0.05).
    pub significance_threshold: f64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub winning_variant_id: Option<String>,
    pub conclusion: Option<String>,
}

impl Experiment {
    /// The control arm. Every stored experiment has exactly one.
    pub fn control(&self) -> Option<&ExperimentVariant> {
        self.variants.iter().find(|v| v.role == VariantRole::Control)
    }

    /// All treatment arms.
    pub fn treatments(&self) -> impl Iterator<Item = &ExperimentVariant> {
        self.variants
            .iter()
            .filter(|v| v.role == VariantRole::Treatment)
    }
}

/// Experiment lifecycle state machine.
///
/// `draft → running ⇄ paused → completed`, with `aborted` reachable from any
/// non-terminal state. `completed` and `aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    Draft,
    Running,
    Paused,
    Completed,
    Aborted,
}

impl ExperimentStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "running" => Some(Self::Running),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }
}

/// What kind of artifact(s) the experiment varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentType {
    Prompt,
    Tool,
    Config,
    /// Varies more than one artifact type at once.
    Multi,
}

impl ExperimentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Tool => "tool",
            Self::Config => "config",
            Self::Multi => "multi",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prompt" => Some(Self::Prompt),
            "tool" => Some(Self::Tool),
            "config" => Some(Self::Config),
            "multi" => Some(Self::Multi),
            _ => None,
        }
    }
}

/// One arm of an experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentVariant {
    pub variant_id: String,
    pub role: VariantRole,
    /// Traffic weight out of 100.
    pub weight: u32,
}

/// The role a variant plays within an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantRole {
    Control,
    Treatment,
}

impl VariantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Treatment => "treatment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "control" => Some(Self::Control),
            "treatment" => Some(Self::Treatment),
            _ => None,
        }
    }
}
