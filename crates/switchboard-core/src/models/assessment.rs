//! Impact assessment output types and the A/B recommendation offered to the
//! external approval workflow.

use serde::{Deserialize, Serialize};

use super::fix::GeneratedFix;

/// Result of assessing a candidate fix. Computed fresh from the fix each
/// time — purely a function of fix content and file path, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixImpactAssessment {
    /// Whether the fix is worth experimentally validating.
    pub should_test: bool,
    pub impact_level: ImpactLevel,
    /// Human-readable reason for the decision (first matching rule).
    pub reason: String,
    pub affected_tests: Vec<String>,
    /// Conversation flows the fix touches (booking, transfer, …).
    pub affected_flows: Vec<String>,
    pub suggested_min_sample_size: u32,
}

/// How much a fix could move call outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    High,
    Medium,
    Low,
    Minimal,
}

impl ImpactLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Minimal => "minimal",
        }
    }
}

/// A/B recommendation offered to the external approval workflow.
/// Nothing is auto-approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbRecommendation {
    pub fix: GeneratedFix,
    pub impact_level: ImpactLevel,
    pub reason: String,
    pub suggested_experiment: SuggestedExperiment,
}

/// Skeleton of the experiment the orchestrator would create for a fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedExperiment {
    pub name: String,
    pub hypothesis: String,
    pub test_ids: Vec<String>,
    pub min_sample_size: u32,
}
