//! Experiment subsystem configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the experiment orchestrator and statistics engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Significance threshold α for hypothesis tests.
    pub significance_threshold: f64,

    /// Default per-arm sample bounds for new experiments.
    pub default_min_sample_size: u32,
    pub default_max_sample_size: u32,

    /// Traffic weight the control arm keeps; treatments split the rest.
    pub control_weight: u32,

    /// Conclude "no difference" once both arms reach this multiple of the
    /// minimum sample size without significance.
    pub no_difference_multiplier: u32,

    /// Default statistical power for upfront sample-size planning.
    pub default_power: f64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            significance_threshold: 0.05,
            default_min_sample_size: 20,
            default_max_sample_size: 100,
            control_weight: 50,
            no_difference_multiplier: 2,
            default_power: 0.8,
        }
    }
}
