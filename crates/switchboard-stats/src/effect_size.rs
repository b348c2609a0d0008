//! Standardized effect sizes: Cohen's d for means, Cohen's h for proportions.

/// Cohen's d with pooled standard deviation, signed treatment − control.
/// Zero pooled variance yields 0.
pub fn cohen_d(
    mean_control: f64,
    var_control: f64,
    n_control: f64,
    mean_treatment: f64,
    var_treatment: f64,
    n_treatment: f64,
) -> f64 {
    let pooled_var = ((n_control - 1.0) * var_control + (n_treatment - 1.0) * var_treatment)
        / (n_control + n_treatment - 2.0);
    if !pooled_var.is_finite() || pooled_var <= 0.0 {
        return 0.0;
    }
    (mean_treatment - mean_control) / pooled_var.sqrt()
}

/// Cohen's h for the difference between two proportions,
/// signed treatment − control. Inputs are clamped to [0, 1].
pub fn cohen_h(p_control: f64, p_treatment: f64) -> f64 {
    let phi = |p: f64| 2.0 * p.clamp(0.0, 1.0).sqrt().asin();
    phi(p_treatment) - phi(p_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cohen_d_zero_variance_is_zero() {
        assert_eq!(cohen_d(1.0, 0.0, 10.0, 5.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn cohen_d_sign_follows_treatment() {
        let d = cohen_d(10.0, 4.0, 20.0, 12.0, 4.0, 20.0);
        assert!(d > 0.0);
        let d = cohen_d(12.0, 4.0, 20.0, 10.0, 4.0, 20.0);
        assert!(d < 0.0);
    }

    #[test]
    fn cohen_h_known_value() {
        // h for 0.5 vs 0.5 is 0; for 0.8 vs 0.92 it is ≈ 0.34.
        assert!(cohen_h(0.5, 0.5).abs() < 1e-12);
        let h = cohen_h(0.8, 0.92);
        assert!((h - 0.34).abs() < 0.01, "got {h}");
    }

    #[test]
    fn cohen_h_antisymmetric() {
        let h1 = cohen_h(0.3, 0.7);
        let h2 = cohen_h(0.7, 0.3);
        assert!((h1 + h2).abs() < 1e-12);
    }
}
