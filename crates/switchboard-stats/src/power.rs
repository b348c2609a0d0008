//! Upfront sample-size planning via two-proportion power analysis.

use crate::intervals::normal_quantile;

/// Required per-arm sample size to detect `min_detectable_effect` (absolute
/// difference in pass rate) over `baseline_rate` at significance `alpha`
/// with the given power.
///
/// Standard two-proportion formula:
/// n = (z_{α/2}·√(2·p̄·q̄) + z_{β}·√(p₁q₁ + p₂q₂))² / (p₂ − p₁)²
///
/// A zero effect is undetectable at any sample size; `u32::MAX` signals
/// that to the caller.
pub fn required_sample_size(
    baseline_rate: f64,
    min_detectable_effect: f64,
    alpha: f64,
    power: f64,
) -> u32 {
    if min_detectable_effect.abs() < f64::EPSILON {
        return u32::MAX;
    }

    let p1 = baseline_rate.clamp(0.0, 1.0);
    let p2 = (baseline_rate + min_detectable_effect).clamp(0.0, 1.0);
    let diff = p2 - p1;
    if diff.abs() < f64::EPSILON {
        return u32::MAX;
    }

    let p_bar = (p1 + p2) / 2.0;
    let q_bar = 1.0 - p_bar;

    let z_alpha = normal_quantile(1.0 - alpha / 2.0);
    let z_beta = normal_quantile(power.clamp(0.0, 1.0 - f64::EPSILON));

    let numerator = z_alpha * (2.0 * p_bar * q_bar).sqrt()
        + z_beta * (p1 * (1.0 - p1) + p2 * (1.0 - p2)).sqrt();
    let n = (numerator * numerator) / (diff * diff);

    n.ceil().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_textbook_value() {
        // Detecting 0.10 over a 0.80 baseline at α=0.05, power 0.8
        // requires roughly 200 runs per arm.
        let n = required_sample_size(0.8, 0.10, 0.05, 0.8);
        assert!((150..=250).contains(&n), "got {n}");
    }

    #[test]
    fn smaller_effects_need_more_samples() {
        let big = required_sample_size(0.7, 0.2, 0.05, 0.8);
        let small = required_sample_size(0.7, 0.05, 0.05, 0.8);
        assert!(small > big);
    }

    #[test]
    fn zero_effect_is_undetectable() {
        assert_eq!(required_sample_size(0.8, 0.0, 0.05, 0.8), u32::MAX);
        // Effect clamped away entirely at the boundary behaves the same.
        assert_eq!(required_sample_size(1.0, 0.5, 0.05, 0.8), u32::MAX);
    }
}
