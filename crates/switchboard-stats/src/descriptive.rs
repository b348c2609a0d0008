//! Per-variant descriptive statistics over raw run observations.

use switchboard_core::models::run::ExperimentRun;

use crate::intervals::{mean_interval, wilson_interval};
use crate::types::{ConfidenceInterval, VariantStats};

/// Aggregate a variant's runs into descriptive statistics.
///
/// Empty input yields an all-zero record with vacuous intervals rather than
/// an error — early experiments routinely ask for stats before any runs
/// exist.
pub fn variant_stats(runs: &[ExperimentRun]) -> VariantStats {
    let n = runs.len() as u32;
    if n == 0 {
        return VariantStats {
            sample_size: 0,
            pass_rate: 0.0,
            pass_rate_interval: wilson_interval(0, 0),
            mean_turn_count: 0.0,
            median_turn_count: 0.0,
            turn_count_interval: ConfidenceInterval { low: 0.0, high: 0.0 },
            mean_duration_ms: 0.0,
            median_duration_ms: 0.0,
            constraint_violation_rate: 0.0,
            error_rate: 0.0,
        };
    }

    let passes = runs.iter().filter(|r| r.passed).count() as u32;
    let turn_counts: Vec<f64> = runs.iter().map(|r| f64::from(r.turn_count)).collect();
    let durations: Vec<f64> = runs.iter().map(|r| r.duration_ms as f64).collect();

    let violations = runs.iter().filter(|r| r.constraint_violations > 0).count();
    let errors = runs.iter().filter(|r| r.error_occurred).count();

    VariantStats {
        sample_size: n,
        pass_rate: f64::from(passes) / f64::from(n),
        pass_rate_interval: wilson_interval(passes, n),
        mean_turn_count: mean(&turn_counts),
        median_turn_count: median(&turn_counts),
        turn_count_interval: mean_interval(&turn_counts),
        mean_duration_ms: mean(&durations),
        median_duration_ms: median(&durations),
        constraint_violation_rate: violations as f64 / f64::from(n),
        error_rate: errors as f64 / f64::from(n),
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Sample variance (n − 1 denominator). Zero for fewer than two values.
pub(crate) fn sample_variance(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0)
}

pub(crate) fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[1.0, 3.0, 2.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn variance_degenerate_inputs() {
        assert_eq!(sample_variance(&[], 0.0), 0.0);
        assert_eq!(sample_variance(&[5.0], 5.0), 0.0);
    }
}
