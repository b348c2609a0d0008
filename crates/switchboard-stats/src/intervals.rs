//! Confidence intervals: Wilson score for proportions, t-based for means.

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::types::ConfidenceInterval;

/// Degrees of freedom above which the t distribution is replaced by the
/// normal approximation.
pub(crate) const NORMAL_FALLBACK_DF: f64 = 100.0;

/// 95% two-sided critical value of the standard normal.
const Z_95: f64 = 1.959_963_984_540_054;

/// Wilson score interval for a proportion at 95% confidence.
///
/// Chosen over the naive normal approximation because it stays within
/// [0, 1] and is well-behaved at small sample sizes. A zero sample size
/// yields the vacuous interval [0, 1].
pub fn wilson_interval(successes: u32, sample_size: u32) -> ConfidenceInterval {
    if sample_size == 0 {
        return ConfidenceInterval { low: 0.0, high: 1.0 };
    }

    let n = f64::from(sample_size);
    let p = f64::from(successes) / n;
    let z = Z_95;
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = (z / denom) * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();

    ConfidenceInterval {
        low: (center - half).max(0.0),
        high: (center + half).min(1.0),
    }
}

/// t-based 95% interval for a sample mean.
///
/// Uses the Student's t critical value for df ≤ 100 and the normal
/// approximation above that. Fewer than two observations yield a
/// zero-width interval at the mean.
pub fn mean_interval(values: &[f64]) -> ConfidenceInterval {
    let n = values.len();
    let mean = if n == 0 {
        0.0
    } else {
        values.iter().sum::<f64>() / n as f64
    };

    if n < 2 {
        return ConfidenceInterval { low: mean, high: mean };
    }

    let variance = values
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / (n as f64 - 1.0);
    let std_err = (variance / n as f64).sqrt();

    let df = n as f64 - 1.0;
    let crit = t_critical_95(df);
    let half = crit * std_err;

    ConfidenceInterval {
        low: mean - half,
        high: mean + half,
    }
}

/// Two-sided 95% critical value for Student's t with the given df,
/// falling back to the normal critical value above df = 100.
pub(crate) fn t_critical_95(df: f64) -> f64 {
    if df > NORMAL_FALLBACK_DF {
        return Z_95;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(t) => t.inverse_cdf(0.975),
        Err(_) => Z_95,
    }
}

/// Standard normal CDF, used by the df > 100 fallback paths.
pub(crate) fn normal_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(n) => n.cdf(x),
        // Unreachable with constant parameters; keep the degenerate-safe
        // convention anyway.
        Err(_) => 0.5,
    }
}

/// Inverse standard normal CDF.
pub(crate) fn normal_quantile(p: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(n) => n.inverse_cdf(p),
        Err(_) => 0.0,
    }
}
