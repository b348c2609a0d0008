//! Experiment-level analysis: lift, effect sizes, recommendation, and the
//! conclusion check the orchestrator acts on.

use switchboard_core::models::run::ExperimentRun;

use crate::chi_square::chi_square_test;
use crate::descriptive::variant_stats;
use crate::effect_size::cohen_h;
use crate::t_test::welch_t_test;
use crate::types::{
    ArmCounts, ConclusionCheck, ConclusionReason, ExperimentAnalysis, Recommendation,
};

/// Analyze a two-arm experiment from its raw runs.
///
/// Recommendation policy: if the chi-square test is significant, recommend
/// whichever arm has the higher pass rate; otherwise, once both arms reach
/// `min_sample_size`, report no difference; otherwise keep collecting.
pub fn analyze_experiment(
    control_runs: &[ExperimentRun],
    treatment_runs: &[ExperimentRun],
    alpha: f64,
    min_sample_size: u32,
) -> ExperimentAnalysis {
    let control = variant_stats(control_runs);
    let treatment = variant_stats(treatment_runs);

    let chi_square = chi_square_test(
        ArmCounts {
            sample_size: control.sample_size,
            passes: control_runs.iter().filter(|r| r.passed).count() as u32,
        },
        ArmCounts {
            sample_size: treatment.sample_size,
            passes: treatment_runs.iter().filter(|r| r.passed).count() as u32,
        },
        alpha,
    );

    let control_turns: Vec<f64> = control_runs.iter().map(|r| f64::from(r.turn_count)).collect();
    let treatment_turns: Vec<f64> =
        treatment_runs.iter().map(|r| f64::from(r.turn_count)).collect();
    let turn_count_test = welch_t_test(&control_turns, &treatment_turns, alpha);

    let pass_rate_lift = pass_rate_lift(control.pass_rate, treatment.pass_rate);
    let pass_rate_effect_h = cohen_h(control.pass_rate, treatment.pass_rate);

    let both_at_min =
        control.sample_size >= min_sample_size && treatment.sample_size >= min_sample_size;

    let (recommendation, reason) = if chi_square.significant {
        if treatment.pass_rate > control.pass_rate {
            (
                Recommendation::AdoptTreatment,
                format!(
                    "treatment pass rate {:.1}% beats control {:.1}% (p = {:.4})",
                    treatment.pass_rate * 100.0,
                    control.pass_rate * 100.0,
                    chi_square.p_value
                ),
            )
        } else {
            (
                Recommendation::KeepControl,
                format!(
                    "control pass rate {:.1}% beats treatment {:.1}% (p = {:.4})",
                    control.pass_rate * 100.0,
                    treatment.pass_rate * 100.0,
                    chi_square.p_value
                ),
            )
        }
    } else if both_at_min {
        (
            Recommendation::NoDifference,
            format!(
                "no significant difference at minimum sample size (p = {:.4})",
                chi_square.p_value
            ),
        )
    } else {
        (
            Recommendation::Continue,
            format!(
                "collecting: control {}/{min_sample_size}, treatment {}/{min_sample_size} runs",
                control.sample_size, treatment.sample_size
            ),
        )
    };

    ExperimentAnalysis {
        control,
        treatment,
        chi_square,
        turn_count_test,
        pass_rate_lift,
        pass_rate_effect_h,
        recommendation,
        reason,
    }
}

/// Percent change in pass rate, treatment vs control.
///
/// A zero control pass rate would divide by zero; in that case the lift is
/// reported as the treatment rate in percentage points.
fn pass_rate_lift(control_rate: f64, treatment_rate: f64) -> f64 {
    if control_rate > 0.0 {
        (treatment_rate - control_rate) / control_rate * 100.0
    } else {
        treatment_rate * 100.0
    }
}

/// Decide whether an experiment should conclude now.
///
/// Priority order matters and is part of the contract:
/// 1. either arm hit `max_sample_size` — conclude regardless of significance;
/// 2. significance achieved with both arms ≥ `min_sample_size` — conclude
///    with a winner;
/// 3. both arms ≥ `no_difference_multiplier` × `min_sample_size` without
///    significance — conclude "no difference";
/// 4. otherwise keep collecting.
///
/// A multiplier below 1 is treated as 1 so rule 3 can never fire before the
/// minimum sample is reached.
pub fn should_conclude(
    analysis: &ExperimentAnalysis,
    min_sample_size: u32,
    max_sample_size: u32,
    no_difference_multiplier: u32,
) -> ConclusionCheck {
    let control_n = analysis.control.sample_size;
    let treatment_n = analysis.treatment.sample_size;

    if control_n >= max_sample_size || treatment_n >= max_sample_size {
        return ConclusionCheck {
            should_conclude: true,
            reason: ConclusionReason::MaxSampleReached,
            recommendation: settle_recommendation(analysis),
        };
    }

    let both_at_min = control_n >= min_sample_size && treatment_n >= min_sample_size;
    if analysis.chi_square.significant && both_at_min {
        return ConclusionCheck {
            should_conclude: true,
            reason: ConclusionReason::SignificanceAchieved,
            recommendation: settle_recommendation(analysis),
        };
    }

    let extended = min_sample_size.saturating_mul(no_difference_multiplier.max(1));
    if control_n >= extended && treatment_n >= extended {
        return ConclusionCheck {
            should_conclude: true,
            reason: ConclusionReason::NoDifference,
            recommendation: Recommendation::NoDifference,
        };
    }

    ConclusionCheck {
        should_conclude: false,
        reason: ConclusionReason::Collecting,
        recommendation: Recommendation::Continue,
    }
}

/// Forced-conclusion recommendation: the significant winner when there is
/// one, otherwise no-difference.
fn settle_recommendation(analysis: &ExperimentAnalysis) -> Recommendation {
    if analysis.chi_square.significant {
        if analysis.treatment.pass_rate > analysis.control.pass_rate {
            Recommendation::AdoptTreatment
        } else {
            Recommendation::KeepControl
        }
    } else {
        Recommendation::NoDifference
    }
}
