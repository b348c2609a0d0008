//! # switchboard-stats
//!
//! Pure, stateless statistics engine for the experimentation core.
//! Hypothesis tests (Yates-corrected chi-square, Welch's t-test),
//! confidence intervals (Wilson score, t-based), effect sizes (Cohen's d/h),
//! experiment analysis, conclusion checks, and sample-size planning.
//!
//! Every function operates on raw per-variant observations and returns
//! well-defined non-significant results on degenerate input (p = 1,
//! effect 0) instead of erroring — downstream recommendation logic must
//! never crash on sparse early data.

pub mod analysis;
pub mod chi_square;
pub mod descriptive;
pub mod effect_size;
pub mod intervals;
pub mod power;
pub mod types;

pub use analysis::{analyze_experiment, should_conclude};
pub use chi_square::chi_square_test;
pub use descriptive::variant_stats;
pub use power::required_sample_size;
pub use t_test::welch_t_test;
pub use types::{
    ArmCounts, ChiSquareResult, ConclusionCheck, ConclusionReason, ConfidenceInterval,
    EffectMagnitude, ExperimentAnalysis, Recommendation, TTestResult, VariantStats,
};
