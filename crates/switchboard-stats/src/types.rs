//! Result types for the statistics engine.

use serde::{Deserialize, Serialize};

/// A two-sided confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

/// Aggregated statistics for one variant's runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantStats {
    pub sample_size: u32,
    /// Fraction of runs that passed, in [0, 1].
    pub pass_rate: f64,
    /// 95% Wilson score interval for the pass rate.
    pub pass_rate_interval: ConfidenceInterval,
    pub mean_turn_count: f64,
    pub median_turn_count: f64,
    /// t-based 95% interval for the mean turn count.
    pub turn_count_interval: ConfidenceInterval,
    pub mean_duration_ms: f64,
    pub median_duration_ms: f64,
    pub constraint_violation_rate: f64,
    pub error_rate: f64,
}

/// Pass/fail counts for one experiment arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmCounts {
    pub sample_size: u32,
    pub passes: u32,
}

impl ArmCounts {
    pub fn failures(&self) -> u32 {
        self.sample_size.saturating_sub(self.passes)
    }

    pub fn pass_rate(&self) -> f64 {
        if self.sample_size == 0 {
            0.0
        } else {
            f64::from(self.passes) / f64::from(self.sample_size)
        }
    }
}

/// Result of the 2×2 contingency chi-square test.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChiSquareResult {
    pub chi_square: f64,
    pub p_value: f64,
    pub significant: bool,
    pub degrees_of_freedom: u32,
}

/// Result of Welch's t-test plus its effect size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TTestResult {
    pub t_statistic: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    pub significant: bool,
    /// Cohen's d, signed treatment − control.
    pub cohen_d: f64,
    pub magnitude: EffectMagnitude,
}

/// Cohen's d bucketed by conventional thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    /// |d| < 0.2
    Negligible,
    /// 0.2 ≤ |d| < 0.5
    Small,
    /// 0.5 ≤ |d| < 0.8
    Medium,
    /// |d| ≥ 0.8
    Large,
}

impl EffectMagnitude {
    pub fn from_cohen_d(d: f64) -> Self {
        let abs = d.abs();
        if abs < 0.2 {
            Self::Negligible
        } else if abs < 0.5 {
            Self::Small
        } else if abs < 0.8 {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

/// What the analysis recommends doing with the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Keep collecting runs.
    Continue,
    AdoptTreatment,
    KeepControl,
    /// Both arms sampled adequately, no detectable difference.
    NoDifference,
}

/// Full analysis of a two-arm experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentAnalysis {
    pub control: VariantStats,
    pub treatment: VariantStats,
    pub chi_square: ChiSquareResult,
    /// Welch's t-test over per-run turn counts.
    pub turn_count_test: TTestResult,
    /// Percent change in pass rate, treatment vs control.
    pub pass_rate_lift: f64,
    /// Cohen's h for the pass-rate difference.
    pub pass_rate_effect_h: f64,
    pub recommendation: Recommendation,
    pub reason: String,
}

/// Why an experiment should (or should not) conclude now.
/// Priority order: max sample > significance > prolonged no-difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConclusionReason {
    /// Either arm hit the max sample size — conclude regardless of
    /// significance.
    MaxSampleReached,
    /// Significance achieved with both arms at or past the minimum.
    SignificanceAchieved,
    /// Both arms at the configured multiple of the minimum with no
    /// significance.
    NoDifference,
    /// Keep collecting.
    Collecting,
}

impl ConclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxSampleReached => "max_sample_reached",
            Self::SignificanceAchieved => "significance_achieved",
            Self::NoDifference => "no_difference",
            Self::Collecting => "collecting",
        }
    }
}

/// Typed conclusion recommendation for the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConclusionCheck {
    pub should_conclude: bool,
    pub reason: ConclusionReason,
    pub recommendation: Recommendation,
}
