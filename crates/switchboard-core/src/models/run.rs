//! Experiment run types: one recorded test execution under a chosen variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::experiment::VariantRole;

/// One recorded test execution under a specific variant.
/// Created once per execution, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentRun {
    pub experiment_id: String,
    pub run_id: String,
    pub test_id: String,
    pub variant_id: String,
    pub variant_role: VariantRole,
    pub recorded_at: DateTime<Utc>,
    pub passed: bool,
    pub turn_count: u32,
    pub duration_ms: u64,
    /// Fraction of scenario goals completed, in [0, 1].
    pub goal_completion_rate: f64,
    pub constraint_violations: u32,
    pub error_occurred: bool,
    pub metrics: RunMetrics,
}

/// Per-run metric sub-record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    pub goals_completed: Option<u32>,
    pub goals_total: Option<u32>,
    /// Total duration divided by turn count.
    pub avg_turn_duration_ms: Option<f64>,
    pub issues_detected: Option<u32>,
    pub error_count: u32,
    pub tokens_used: Option<u64>,
    pub cost_usd: Option<f64>,
}

/// Test execution outcome supplied by the external test runner
/// once a scenario finishes under a selected variant (consumed, not owned).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    pub run_id: String,
    pub test_id: String,
    pub passed: bool,
    pub turn_count: u32,
    pub duration_ms: u64,
    pub goal_completion_rate: f64,
    pub constraint_violations: u32,
    pub error_occurred: bool,
    pub goals_completed: Option<u32>,
    pub goals_total: Option<u32>,
    pub issues_detected: Option<u32>,
    pub tokens_used: Option<u64>,
    pub cost_usd: Option<f64>,
}
