//! 2×2 contingency chi-square test with Yates' continuity correction.
//!
//! Yates' correction is applied unconditionally, matching standard practice
//! for 2×2 tables with small expected counts. There is no Fisher's exact
//! fallback for very small samples — a known approximation.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::types::{ArmCounts, ChiSquareResult};

/// Compare pass/fail counts between control and treatment.
///
/// Degenerate cases — either arm with fewer than 2 runs, or any expected
/// cell of 0 — return non-significant with p = 1 instead of dividing by
/// zero.
pub fn chi_square_test(control: ArmCounts, treatment: ArmCounts, alpha: f64) -> ChiSquareResult {
    if control.sample_size < 2 || treatment.sample_size < 2 {
        return degenerate();
    }

    let observed = [
        [f64::from(control.passes), f64::from(control.failures())],
        [f64::from(treatment.passes), f64::from(treatment.failures())],
    ];

    let row_totals = [
        observed[0][0] + observed[0][1],
        observed[1][0] + observed[1][1],
    ];
    let col_totals = [
        observed[0][0] + observed[1][0],
        observed[0][1] + observed[1][1],
    ];
    let total = row_totals[0] + row_totals[1];

    let mut chi_square = 0.0;
    for (i, row) in observed.iter().enumerate() {
        for (j, &obs) in row.iter().enumerate() {
            let expected = row_totals[i] * col_totals[j] / total;
            if expected == 0.0 {
                return degenerate();
            }
            // Yates' continuity correction.
            let diff = (obs - expected).abs() - 0.5;
            let diff = diff.max(0.0);
            chi_square += diff * diff / expected;
        }
    }

    let p_value = chi_square_p_value(chi_square);

    ChiSquareResult {
        chi_square,
        p_value,
        significant: p_value < alpha,
        degrees_of_freedom: 1,
    }
}

/// Upper-tail p-value for a chi-square statistic with 1 df.
fn chi_square_p_value(statistic: f64) -> f64 {
    if !statistic.is_finite() || statistic <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(1.0) {
        Ok(dist) => (1.0 - dist.cdf(statistic)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

fn degenerate() -> ChiSquareResult {
    ChiSquareResult {
        chi_square: 0.0,
        p_value: 1.0,
        significant: false,
        degrees_of_freedom: 1,
    }
}
