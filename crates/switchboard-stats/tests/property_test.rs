//! Property tests for the numeric core: degenerate safety, symmetry,
//! interval bounds.

use proptest::prelude::*;
use switchboard_stats::{chi_square_test, welch_t_test, ArmCounts};
use switchboard_stats::intervals::wilson_interval;

proptest! {
    // Chi-square never panics, never returns NaN, and p stays in [0, 1].
    #[test]
    fn chi_square_is_total(
        n_c in 0u32..500,
        n_t in 0u32..500,
        pass_frac_c in 0.0f64..=1.0,
        pass_frac_t in 0.0f64..=1.0,
    ) {
        let control = ArmCounts {
            sample_size: n_c,
            passes: (f64::from(n_c) * pass_frac_c) as u32,
        };
        let treatment = ArmCounts {
            sample_size: n_t,
            passes: (f64::from(n_t) * pass_frac_t) as u32,
        };
        let result = chi_square_test(control, treatment, 0.05);
        prop_assert!(result.p_value.is_finite());
        prop_assert!((0.0..=1.0).contains(&result.p_value));
        prop_assert!(result.chi_square.is_finite());
        prop_assert!(result.chi_square >= 0.0);
    }

    // Swapping arm labels and pass/fail counts leaves p unchanged.
    #[test]
    fn chi_square_symmetric_under_label_swap(
        n in 2u32..300,
        passes_c in 0u32..300,
        passes_t in 0u32..300,
    ) {
        let control = ArmCounts { sample_size: n, passes: passes_c.min(n) };
        let treatment = ArmCounts { sample_size: n, passes: passes_t.min(n) };
        let forward = chi_square_test(control, treatment, 0.05);
        let swapped = chi_square_test(treatment, control, 0.05);
        prop_assert!((forward.p_value - swapped.p_value).abs() < 1e-9);
    }

    // Wilson interval always stays in [0, 1] and brackets the point estimate.
    #[test]
    fn wilson_brackets_the_proportion(passes in 0u32..1000, extra in 0u32..1000) {
        let n = passes + extra;
        let ci = wilson_interval(passes, n);
        prop_assert!(ci.low >= 0.0);
        prop_assert!(ci.high <= 1.0);
        prop_assert!(ci.low <= ci.high);
        if n > 0 {
            let p = f64::from(passes) / f64::from(n);
            prop_assert!(ci.low <= p + 1e-12);
            prop_assert!(ci.high >= p - 1e-12);
        }
    }

    // Welch's t-test is total over arbitrary small samples.
    #[test]
    fn t_test_is_total(
        control in prop::collection::vec(0.0f64..1000.0, 0..40),
        treatment in prop::collection::vec(0.0f64..1000.0, 0..40),
    ) {
        let result = welch_t_test(&control, &treatment, 0.05);
        prop_assert!(result.p_value.is_finite());
        prop_assert!((0.0..=1.0).contains(&result.p_value));
        prop_assert!(!result.cohen_d.is_nan());
    }
}
