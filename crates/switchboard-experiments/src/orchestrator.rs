//! `ExperimentOrchestrator` — the experiment lifecycle state machine,
//! weighted variant selection, result recording, and winner promotion.
//!
//! State machine: `draft → running ⇄ paused → completed`, with `aborted`
//! reachable from any non-terminal state. Transitions go through the
//! storage layer's compare-and-set so concurrent transitions on one
//! experiment serialize; a losing racer gets `InvalidTransition` with the
//! status it actually found.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use switchboard_core::config::ExperimentConfig;
use switchboard_core::errors::{ExperimentError, VariantError};
use switchboard_core::models::assessment::{AbRecommendation, SuggestedExperiment};
use switchboard_core::models::experiment::{
    Experiment, ExperimentStatus, ExperimentType, ExperimentVariant, VariantRole,
};
use switchboard_core::models::fix::GeneratedFix;
use switchboard_core::models::run::{ExperimentRun, RunMetrics, TestOutcome};
use switchboard_core::traits::IExperimentStorage;
use switchboard_stats::analysis::{analyze_experiment, should_conclude};
use switchboard_stats::power::required_sample_size;
use switchboard_stats::types::{ConclusionCheck, ExperimentAnalysis, Recommendation};

use crate::assessor::assess_fix_impact;
use crate::variants::store::VariantStore;

/// Input for creating an experiment.
#[derive(Debug, Clone)]
pub struct NewExperiment {
    pub name: String,
    pub description: String,
    pub hypothesis: String,
    pub experiment_type: ExperimentType,
    pub control_variant_id: String,
    pub treatment_variant_ids: Vec<String>,
    pub test_ids: Vec<String>,
    pub min_sample_size: Option<u32>,
    pub max_sample_size: Option<u32>,
    /// Explicit traffic split (variant_id → weight). Must sum to 100.
    /// Defaults to the constructed weights.
    pub traffic_split: Option<BTreeMap<String, u32>>,
}

/// Selection result handed to the external test runner so it can
/// substitute the chosen artifact content before execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedVariant {
    pub variant_id: String,
    pub role: VariantRole,
    pub content: String,
    pub target_file: String,
}

/// Per-treatment analysis within a summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentAnalysis {
    pub variant_id: String,
    pub analysis: ExperimentAnalysis,
}

/// Read-only projection of an experiment for the external dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub experiment: Experiment,
    /// variant_id → recorded run count.
    pub run_counts: BTreeMap<String, u32>,
    /// Control-vs-treatment analysis per treatment arm. Empty unless the
    /// experiment is running or completed.
    pub analyses: Vec<TreatmentAnalysis>,
}

/// Experiment lifecycle service. Storage and the variant store are
/// injected; the orchestrator holds no state of its own.
pub struct ExperimentOrchestrator {
    experiments: Arc<dyn IExperimentStorage>,
    variant_store: VariantStore,
    config: ExperimentConfig,
}

impl ExperimentOrchestrator {
    pub fn new(
        experiments: Arc<dyn IExperimentStorage>,
        variant_store: VariantStore,
        config: ExperimentConfig,
    ) -> Self {
        Self {
            experiments,
            variant_store,
            config,
        }
    }

    pub fn variant_store(&self) -> &VariantStore {
        &self.variant_store
    }

    /// Create a draft experiment.
    ///
    /// Weights: control keeps `control_weight` (50 by default); treatments
    /// split the remainder evenly, with any rounding remainder added to
    /// the control so the weights sum to exactly 100.
    pub fn create_experiment(&self, input: NewExperiment) -> Result<Experiment, ExperimentError> {
        if input.treatment_variant_ids.is_empty() {
            return Err(ExperimentError::NoTreatments);
        }

        let treatment_count = input.treatment_variant_ids.len() as u32;
        // A misconfigured control weight above 100 would leave no traffic
        // pool at all; clamp it rather than underflow.
        let control_base = self.config.control_weight.min(100);
        let treatment_pool = 100 - control_base;
        let per_treatment = treatment_pool / treatment_count;
        let control_weight = control_base + treatment_pool % treatment_count;

        let mut variants = Vec::with_capacity(input.treatment_variant_ids.len() + 1);
        variants.push(ExperimentVariant {
            variant_id: input.control_variant_id.clone(),
            role: VariantRole::Control,
            weight: control_weight,
        });
        for variant_id in &input.treatment_variant_ids {
            variants.push(ExperimentVariant {
                variant_id: variant_id.clone(),
                role: VariantRole::Treatment,
                weight: per_treatment,
            });
        }

        let traffic_split = match input.traffic_split {
            Some(split) => {
                let total: u32 = split.values().sum();
                if total != 100 {
                    return Err(ExperimentError::InvalidTrafficSplit { total });
                }
                split
            }
            None => variants
                .iter()
                .map(|v| (v.variant_id.clone(), v.weight))
                .collect(),
        };

        let experiment = Experiment {
            experiment_id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            hypothesis: input.hypothesis,
            status: ExperimentStatus::Draft,
            experiment_type: input.experiment_type,
            variants,
            test_ids: input.test_ids,
            traffic_split,
            min_sample_size: input
                .min_sample_size
                .unwrap_or(self.config.default_min_sample_size),
            max_sample_size: input
                .max_sample_size
                .unwrap_or(self.config.default_max_sample_size),
            significance_threshold: self.config.significance_threshold,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            winning_variant_id: None,
            conclusion: None,
        };

        self.experiments.insert_experiment(&experiment)?;
        info!(
            experiment_id = %experiment.experiment_id,
            name = %experiment.name,
            treatments = treatment_count,
            "experiment created"
        );
        Ok(experiment)
    }

    /// Start a draft or resume a paused experiment.
    pub fn start(&self, experiment_id: &str) -> Result<Experiment, ExperimentError> {
        self.transition(
            experiment_id,
            "start",
            &[ExperimentStatus::Draft, ExperimentStatus::Paused],
            ExperimentStatus::Running,
        )
    }

    pub fn pause(&self, experiment_id: &str) -> Result<Experiment, ExperimentError> {
        self.transition(
            experiment_id,
            "pause",
            &[ExperimentStatus::Running],
            ExperimentStatus::Paused,
        )
    }

    /// Conclude the experiment: runs the statistical analysis, records the
    /// winner (if any) and the conclusion text, and moves to `completed`.
    pub fn complete(&self, experiment_id: &str) -> Result<Experiment, ExperimentError> {
        let experiment = self.require(experiment_id)?;
        let (winner, conclusion) = self.settle(&experiment)?;

        self.transition(
            experiment_id,
            "complete",
            &[ExperimentStatus::Running, ExperimentStatus::Paused],
            ExperimentStatus::Completed,
        )?;
        self.experiments
            .set_outcome(experiment_id, winner.as_deref(), &conclusion)?;

        info!(
            experiment_id,
            winner = winner.as_deref().unwrap_or("none"),
            %conclusion,
            "experiment completed"
        );
        self.require(experiment_id)
    }

    /// Abort from any non-terminal state, recording the reason.
    pub fn abort(&self, experiment_id: &str, reason: &str) -> Result<Experiment, ExperimentError> {
        self.transition(
            experiment_id,
            "abort",
            &[
                ExperimentStatus::Draft,
                ExperimentStatus::Running,
                ExperimentStatus::Paused,
            ],
            ExperimentStatus::Aborted,
        )?;
        self.experiments
            .set_outcome(experiment_id, None, &format!("aborted: {reason}"))?;
        warn!(experiment_id, reason, "experiment aborted");
        self.require(experiment_id)
    }

    /// Weighted random variant selection for a test execution. Only
    /// permitted while the experiment is running.
    ///
    /// A treatment whose content cannot be loaded degrades to the control
    /// variant rather than failing the test run.
    pub fn select_variant(
        &self,
        experiment_id: &str,
        test_id: &str,
    ) -> Result<SelectedVariant, ExperimentError> {
        let experiment = self.require(experiment_id)?;
        if experiment.status != ExperimentStatus::Running {
            return Err(ExperimentError::NotRunning {
                experiment_id: experiment_id.to_string(),
                current: experiment.status,
            });
        }

        let r = rand::rng().random_range(0..100u32);
        let chosen = pick_variant(&experiment, r);

        match self.load_selection(&experiment, chosen) {
            Ok(selected) => {
                info!(
                    experiment_id,
                    test_id,
                    variant_id = %selected.variant_id,
                    role = selected.role.as_str(),
                    "variant selected"
                );
                Ok(selected)
            }
            Err(e) => {
                // Availability over strictness: degrade to the control.
                warn!(
                    experiment_id,
                    test_id,
                    error = %e,
                    "selected variant unavailable, falling back to control"
                );
                let control =
                    experiment
                        .control()
                        .ok_or_else(|| ExperimentError::MissingControl { count: 0 })?;
                self.load_selection(&experiment, control)
                    .map_err(ExperimentError::from)
            }
        }
    }

    fn load_selection(
        &self,
        experiment: &Experiment,
        arm: &ExperimentVariant,
    ) -> Result<SelectedVariant, VariantError> {
        let variant = self.variant_store.get_variant(&arm.variant_id)?;
        Ok(SelectedVariant {
            variant_id: variant.variant_id,
            role: arm.role,
            content: variant.content,
            target_file: variant.target_file,
        })
    }

    /// Translate an external test outcome into a persisted run.
    pub fn record_test_result(
        &self,
        experiment_id: &str,
        variant_id: &str,
        outcome: &TestOutcome,
    ) -> Result<ExperimentRun, ExperimentError> {
        let experiment = self.require(experiment_id)?;
        let arm = experiment
            .variants
            .iter()
            .find(|v| v.variant_id == variant_id)
            .ok_or_else(|| VariantError::VariantNotFound {
                variant_id: variant_id.to_string(),
            })?;

        let avg_turn_duration_ms = if outcome.turn_count > 0 {
            Some(outcome.duration_ms as f64 / f64::from(outcome.turn_count))
        } else {
            None
        };

        let run = ExperimentRun {
            experiment_id: experiment_id.to_string(),
            run_id: outcome.run_id.clone(),
            test_id: outcome.test_id.clone(),
            variant_id: variant_id.to_string(),
            variant_role: arm.role,
            recorded_at: Utc::now(),
            passed: outcome.passed,
            turn_count: outcome.turn_count,
            duration_ms: outcome.duration_ms,
            goal_completion_rate: outcome.goal_completion_rate,
            constraint_violations: outcome.constraint_violations,
            error_occurred: outcome.error_occurred,
            metrics: RunMetrics {
                goals_completed: outcome.goals_completed,
                goals_total: outcome.goals_total,
                avg_turn_duration_ms,
                issues_detected: outcome.issues_detected,
                error_count: u32::from(outcome.error_occurred),
                tokens_used: outcome.tokens_used,
                cost_usd: outcome.cost_usd,
            },
        };

        self.experiments.insert_run(&run)?;
        Ok(run)
    }

    /// Whether the experiment should conclude now, by the priority-ordered
    /// stopping rules. Evaluated against the worst-performing treatment
    /// constraint: every treatment arm must satisfy the rule.
    pub fn conclusion_check(&self, experiment_id: &str) -> Result<ConclusionCheck, ExperimentError> {
        let experiment = self.require(experiment_id)?;
        let analysis = self.primary_analysis(&experiment)?;
        Ok(should_conclude(
            &analysis,
            experiment.min_sample_size,
            experiment.max_sample_size,
            self.config.no_difference_multiplier,
        ))
    }

    /// Permanently promote the recorded winner: flag it as baseline and
    /// write its content to the live file. One-way — no rollback is
    /// retained; the append-only variant history is the audit trail.
    pub fn adopt_winner(&self, experiment_id: &str) -> Result<(), ExperimentError> {
        let experiment = self.require(experiment_id)?;
        let winner = experiment
            .winning_variant_id
            .as_deref()
            .ok_or_else(|| ExperimentError::NoWinner {
                experiment_id: experiment_id.to_string(),
            })?;

        let variant = self.variant_store.promote(winner)?;
        info!(
            experiment_id,
            variant_id = %variant.variant_id,
            target_file = %variant.target_file,
            "winner adopted as live baseline"
        );
        Ok(())
    }

    /// Dashboard projection: metadata, per-variant run counts, and the
    /// statistical analyses (only computed while running or after
    /// completion).
    pub fn experiment_summary(
        &self,
        experiment_id: &str,
    ) -> Result<ExperimentSummary, ExperimentError> {
        let experiment = self.require(experiment_id)?;
        let run_counts: BTreeMap<String, u32> = self
            .experiments
            .count_runs_by_variant(experiment_id)?
            .into_iter()
            .collect();

        let analyses = if matches!(
            experiment.status,
            ExperimentStatus::Running | ExperimentStatus::Completed
        ) {
            self.analyze_all(&experiment)?
        } else {
            Vec::new()
        };

        Ok(ExperimentSummary {
            experiment,
            run_counts,
            analyses,
        })
    }

    /// Assess a fix and, when it is worth testing, produce the A/B
    /// recommendation for the external approval workflow. Nothing is
    /// auto-approved.
    pub fn evaluate_fix(&self, fix: &GeneratedFix) -> Option<AbRecommendation> {
        let assessment = assess_fix_impact(fix);
        if !assessment.should_test {
            info!(
                fix_id = %fix.fix_id,
                impact = assessment.impact_level.as_str(),
                reason = %assessment.reason,
                "fix not worth an experiment"
            );
            return None;
        }

        Some(AbRecommendation {
            fix: fix.clone(),
            impact_level: assessment.impact_level,
            reason: assessment.reason,
            suggested_experiment: SuggestedExperiment {
                name: format!("A/B: {}", fix.change_description),
                hypothesis: format!(
                    "'{}' improves pass rate on affected tests",
                    fix.change_description
                ),
                test_ids: fix.affected_tests.clone(),
                min_sample_size: assessment.suggested_min_sample_size,
            },
        })
    }

    /// Per-arm sample size needed to detect `min_detectable_effect`
    /// (absolute pass-rate difference) over `baseline_rate`, at the
    /// configured significance threshold and power.
    pub fn plan_sample_size(&self, baseline_rate: f64, min_detectable_effect: f64) -> u32 {
        required_sample_size(
            baseline_rate,
            min_detectable_effect,
            self.config.significance_threshold,
            self.config.default_power,
        )
    }

    fn require(&self, experiment_id: &str) -> Result<Experiment, ExperimentError> {
        self.experiments
            .get_experiment(experiment_id)?
            .ok_or_else(|| ExperimentError::ExperimentNotFound {
                experiment_id: experiment_id.to_string(),
            })
    }

    /// CAS transition; a losing racer learns the status it actually found.
    fn transition(
        &self,
        experiment_id: &str,
        action: &'static str,
        allowed_from: &[ExperimentStatus],
        to: ExperimentStatus,
    ) -> Result<Experiment, ExperimentError> {
        if self
            .experiments
            .transition_status(experiment_id, allowed_from, to)?
        {
            return self.require(experiment_id);
        }

        let current = self.require(experiment_id)?;
        Err(ExperimentError::InvalidTransition {
            experiment_id: experiment_id.to_string(),
            action,
            current: current.status,
        })
    }

    /// Control-vs-treatment analysis for every treatment arm.
    fn analyze_all(
        &self,
        experiment: &Experiment,
    ) -> Result<Vec<TreatmentAnalysis>, ExperimentError> {
        let control = experiment
            .control()
            .ok_or(ExperimentError::MissingControl { count: 0 })?;
        let control_runs = self
            .experiments
            .get_runs_by_variant(&experiment.experiment_id, &control.variant_id)?;

        let mut analyses = Vec::new();
        for treatment in experiment.treatments() {
            let treatment_runs = self
                .experiments
                .get_runs_by_variant(&experiment.experiment_id, &treatment.variant_id)?;
            analyses.push(TreatmentAnalysis {
                variant_id: treatment.variant_id.clone(),
                analysis: analyze_experiment(
                    &control_runs,
                    &treatment_runs,
                    experiment.significance_threshold,
                    experiment.min_sample_size,
                ),
            });
        }
        Ok(analyses)
    }

    /// The analysis the stopping rules evaluate: the treatment arm with
    /// the fewest runs is the binding constraint.
    fn primary_analysis(
        &self,
        experiment: &Experiment,
    ) -> Result<ExperimentAnalysis, ExperimentError> {
        let analyses = self.analyze_all(experiment)?;
        analyses
            .into_iter()
            .map(|t| t.analysis)
            .min_by_key(|a| a.treatment.sample_size)
            .ok_or(ExperimentError::NoTreatments)
    }

    /// Pick the winner and conclusion text at completion time.
    fn settle(&self, experiment: &Experiment) -> Result<(Option<String>, String), ExperimentError> {
        let analyses = self.analyze_all(experiment)?;
        let control = experiment
            .control()
            .ok_or(ExperimentError::MissingControl { count: 0 })?;

        // Best significant treatment wins; a significant control win keeps
        // the control; otherwise no winner.
        let best_treatment = analyses
            .iter()
            .filter(|t| t.analysis.recommendation == Recommendation::AdoptTreatment)
            .max_by(|a, b| {
                a.analysis
                    .treatment
                    .pass_rate
                    .total_cmp(&b.analysis.treatment.pass_rate)
            });
        if let Some(t) = best_treatment {
            return Ok((Some(t.variant_id.clone()), t.analysis.reason.clone()));
        }

        if let Some(t) = analyses
            .iter()
            .find(|t| t.analysis.recommendation == Recommendation::KeepControl)
        {
            return Ok((Some(control.variant_id.clone()), t.analysis.reason.clone()));
        }

        let reason = analyses
            .first()
            .map(|t| t.analysis.reason.clone())
            .unwrap_or_else(|| "no treatment runs recorded".to_string());
        Ok((None, reason))
    }
}

/// Deterministic core of the weighted draw: walk the arms in declaration
/// order accumulating traffic weight, return the first arm whose cumulative
/// weight exceeds `r`. Falls back to the control (arm 0) if the weights do
/// not cover `r`.
pub(crate) fn pick_variant(experiment: &Experiment, r: u32) -> &ExperimentVariant {
    let mut cumulative = 0;
    for arm in &experiment.variants {
        cumulative += experiment
            .traffic_split
            .get(&arm.variant_id)
            .copied()
            .unwrap_or(arm.weight);
        if r < cumulative {
            return arm;
        }
    }
    &experiment.variants[0]
}
