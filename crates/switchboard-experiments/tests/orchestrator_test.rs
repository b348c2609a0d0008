//! Orchestrator lifecycle, selection, and end-to-end conclusion tests.

use std::sync::Arc;

use switchboard_core::config::ExperimentConfig;
use switchboard_core::errors::ExperimentError;
use switchboard_core::models::experiment::{ExperimentStatus, ExperimentType, VariantRole};
use switchboard_core::models::run::TestOutcome;
use switchboard_core::models::variant::{NewVariant, Variant, VariantOrigin, VariantType};
use switchboard_experiments::{ExperimentOrchestrator, NewExperiment, VariantStore};
use switchboard_stats::types::{ConclusionReason, Recommendation};
use switchboard_storage::SwitchboardStorageEngine;
use tempfile::TempDir;
use uuid::Uuid;

struct Harness {
    _dir: TempDir,
    orchestrator: ExperimentOrchestrator,
}

fn harness() -> Harness {
    harness_with_config(ExperimentConfig::default())
}

fn harness_with_config(config: ExperimentConfig) -> Harness {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(SwitchboardStorageEngine::open_in_memory().unwrap());
    let store = VariantStore::new(engine.clone(), dir.path());
    let orchestrator = ExperimentOrchestrator::new(engine, store, config);
    Harness {
        _dir: dir,
        orchestrator,
    }
}

fn make_variant(h: &Harness, content: &str) -> Variant {
    h.orchestrator
        .variant_store()
        .create_variant(NewVariant {
            variant_type: VariantType::Prompt,
            target_file: "prompts/agent.md".to_string(),
            name: "test".to_string(),
            description: String::new(),
            content: content.to_string(),
            baseline_variant_id: None,
            source_fix_id: None,
            is_baseline: false,
            created_by: VariantOrigin::Manual,
            metadata: None,
        })
        .unwrap()
}

fn new_experiment(control: &str, treatments: Vec<String>) -> NewExperiment {
    NewExperiment {
        name: "greeting experiment".to_string(),
        description: String::new(),
        hypothesis: "new greeting improves pass rate".to_string(),
        experiment_type: ExperimentType::Prompt,
        control_variant_id: control.to_string(),
        treatment_variant_ids: treatments,
        test_ids: vec!["test-1".to_string()],
        min_sample_size: None,
        max_sample_size: None,
        traffic_split: None,
    }
}

fn outcome(passed: bool) -> TestOutcome {
    TestOutcome {
        run_id: Uuid::new_v4().to_string(),
        test_id: "test-1".to_string(),
        passed,
        turn_count: 10,
        duration_ms: 30_000,
        goal_completion_rate: if passed { 1.0 } else { 0.4 },
        constraint_violations: 0,
        error_occurred: false,
        goals_completed: None,
        goals_total: None,
        issues_detected: None,
        tokens_used: None,
        cost_usd: None,
    }
}

fn record_runs(h: &Harness, experiment_id: &str, variant_id: &str, passes: u32, failures: u32) {
    for _ in 0..passes {
        h.orchestrator
            .record_test_result(experiment_id, variant_id, &outcome(true))
            .unwrap();
    }
    for _ in 0..failures {
        h.orchestrator
            .record_test_result(experiment_id, variant_id, &outcome(false))
            .unwrap();
    }
}

#[test]
fn traffic_weights_sum_to_100_for_any_treatment_count() {
    for treatment_count in 1..=7 {
        let h = harness();
        let control = make_variant(&h, "control");
        let treatments: Vec<String> = (0..treatment_count)
            .map(|i| make_variant(&h, &format!("treatment {i}")).variant_id)
            .collect();

        let experiment = h
            .orchestrator
            .create_experiment(new_experiment(&control.variant_id, treatments))
            .unwrap();

        let total: u32 = experiment.traffic_split.values().sum();
        assert_eq!(total, 100, "treatment_count = {treatment_count}");
        // Remainder lands on the control.
        assert!(experiment.control().unwrap().weight >= 50);
    }
}

#[test]
fn experiment_without_treatments_is_rejected() {
    let h = harness();
    let control = make_variant(&h, "control");
    let err = h
        .orchestrator
        .create_experiment(new_experiment(&control.variant_id, vec![]))
        .unwrap_err();
    assert!(matches!(err, ExperimentError::NoTreatments));
}

#[test]
fn explicit_traffic_split_must_sum_to_100() {
    let h = harness();
    let control = make_variant(&h, "control");
    let treatment = make_variant(&h, "treatment");

    let mut input = new_experiment(&control.variant_id, vec![treatment.variant_id.clone()]);
    let mut split = std::collections::BTreeMap::new();
    split.insert(control.variant_id.clone(), 60);
    split.insert(treatment.variant_id.clone(), 30);
    input.traffic_split = Some(split);

    let err = h.orchestrator.create_experiment(input).unwrap_err();
    assert!(matches!(
        err,
        ExperimentError::InvalidTrafficSplit { total: 90 }
    ));
}

#[test]
fn lifecycle_transitions_follow_the_state_machine() {
    let h = harness();
    let control = make_variant(&h, "control");
    let treatment = make_variant(&h, "treatment");
    let experiment = h
        .orchestrator
        .create_experiment(new_experiment(&control.variant_id, vec![treatment.variant_id]))
        .unwrap();
    let id = experiment.experiment_id.as_str();

    // pause from draft is invalid.
    let err = h.orchestrator.pause(id).unwrap_err();
    assert!(matches!(
        err,
        ExperimentError::InvalidTransition {
            action: "pause",
            current: ExperimentStatus::Draft,
            ..
        }
    ));

    assert_eq!(h.orchestrator.start(id).unwrap().status, ExperimentStatus::Running);
    assert_eq!(h.orchestrator.pause(id).unwrap().status, ExperimentStatus::Paused);
    // Resume.
    assert_eq!(h.orchestrator.start(id).unwrap().status, ExperimentStatus::Running);

    let aborted = h.orchestrator.abort(id, "bad variant content").unwrap();
    assert_eq!(aborted.status, ExperimentStatus::Aborted);
    assert_eq!(aborted.conclusion.as_deref(), Some("aborted: bad variant content"));

    // Terminal: nothing restarts an aborted experiment.
    let err = h.orchestrator.start(id).unwrap_err();
    assert!(matches!(
        err,
        ExperimentError::InvalidTransition {
            action: "start",
            current: ExperimentStatus::Aborted,
            ..
        }
    ));
}

#[test]
fn selection_requires_a_running_experiment() {
    let h = harness();
    let control = make_variant(&h, "control");
    let treatment = make_variant(&h, "treatment");
    let experiment = h
        .orchestrator
        .create_experiment(new_experiment(&control.variant_id, vec![treatment.variant_id]))
        .unwrap();

    let err = h
        .orchestrator
        .select_variant(&experiment.experiment_id, "test-1")
        .unwrap_err();
    assert!(matches!(err, ExperimentError::NotRunning { .. }));
}

#[test]
fn selection_returns_variant_content_for_the_runner() {
    let h = harness();
    let control = make_variant(&h, "control content");
    let treatment = make_variant(&h, "treatment content");
    let experiment = h
        .orchestrator
        .create_experiment(new_experiment(&control.variant_id, vec![treatment.variant_id]))
        .unwrap();
    h.orchestrator.start(&experiment.experiment_id).unwrap();

    for _ in 0..20 {
        let selected = h
            .orchestrator
            .select_variant(&experiment.experiment_id, "test-1")
            .unwrap();
        assert_eq!(selected.target_file, "prompts/agent.md");
        match selected.role {
            VariantRole::Control => assert_eq!(selected.content, "control content"),
            VariantRole::Treatment => assert_eq!(selected.content, "treatment content"),
        }
    }
}

#[test]
fn selection_falls_back_to_control_when_treatment_is_missing() {
    let h = harness();
    let control = make_variant(&h, "control content");
    let experiment = h
        .orchestrator
        .create_experiment(new_experiment(
            &control.variant_id,
            vec!["variant-that-does-not-exist".to_string()],
        ))
        .unwrap();
    h.orchestrator.start(&experiment.experiment_id).unwrap();

    // Every draw must resolve: the broken treatment degrades to control.
    for _ in 0..50 {
        let selected = h
            .orchestrator
            .select_variant(&experiment.experiment_id, "test-1")
            .unwrap();
        assert_eq!(selected.variant_id, control.variant_id);
        assert_eq!(selected.role, VariantRole::Control);
    }
}

#[test]
fn record_test_result_computes_average_turn_duration() {
    let h = harness();
    let control = make_variant(&h, "control");
    let treatment = make_variant(&h, "treatment");
    let experiment = h
        .orchestrator
        .create_experiment(new_experiment(&control.variant_id, vec![treatment.variant_id]))
        .unwrap();
    h.orchestrator.start(&experiment.experiment_id).unwrap();

    let run = h
        .orchestrator
        .record_test_result(&experiment.experiment_id, &control.variant_id, &outcome(true))
        .unwrap();
    assert_eq!(run.variant_role, VariantRole::Control);
    assert_eq!(run.metrics.avg_turn_duration_ms, Some(3_000.0));
}

#[test]
fn end_to_end_significant_treatment_wins_and_is_adopted() {
    let h = harness();
    std::fs::create_dir_all(h._dir.path().join("prompts")).unwrap();
    std::fs::write(h._dir.path().join("prompts/agent.md"), "live content").unwrap();

    let control = make_variant(&h, "control content");
    let treatment = make_variant(&h, "treatment content");

    let mut input = new_experiment(&control.variant_id, vec![treatment.variant_id.clone()]);
    input.max_sample_size = Some(150);
    let experiment = h.orchestrator.create_experiment(input).unwrap();
    let id = experiment.experiment_id.as_str();
    h.orchestrator.start(id).unwrap();

    // 80% vs 92% over 100 runs each is significant at α = 0.05.
    record_runs(&h, id, &control.variant_id, 80, 20);
    record_runs(&h, id, &treatment.variant_id, 92, 8);

    let check = h.orchestrator.conclusion_check(id).unwrap();
    assert!(check.should_conclude);
    assert_eq!(check.reason, ConclusionReason::SignificanceAchieved);
    assert_eq!(check.recommendation, Recommendation::AdoptTreatment);

    let completed = h.orchestrator.complete(id).unwrap();
    assert_eq!(completed.status, ExperimentStatus::Completed);
    assert_eq!(
        completed.winning_variant_id.as_deref(),
        Some(treatment.variant_id.as_str())
    );
    assert!(completed.conclusion.is_some());

    h.orchestrator.adopt_winner(id).unwrap();
    let live = std::fs::read_to_string(h._dir.path().join("prompts/agent.md")).unwrap();
    assert_eq!(live, "treatment content");
    let baseline = h
        .orchestrator
        .variant_store()
        .get_baseline("prompts/agent.md")
        .unwrap()
        .unwrap();
    assert_eq!(baseline.variant_id, treatment.variant_id);
}

#[test]
fn no_difference_experiment_completes_without_winner() {
    let h = harness();
    let control = make_variant(&h, "control");
    let treatment = make_variant(&h, "treatment");
    let experiment = h
        .orchestrator
        .create_experiment(new_experiment(&control.variant_id, vec![treatment.variant_id.clone()]))
        .unwrap();
    let id = experiment.experiment_id.as_str();
    h.orchestrator.start(id).unwrap();

    // Same pass rate in both arms, past 2× the minimum sample size.
    record_runs(&h, id, &control.variant_id, 32, 8);
    record_runs(&h, id, &treatment.variant_id, 33, 7);

    let check = h.orchestrator.conclusion_check(id).unwrap();
    assert!(check.should_conclude);
    assert_eq!(check.reason, ConclusionReason::NoDifference);

    let completed = h.orchestrator.complete(id).unwrap();
    assert_eq!(completed.winning_variant_id, None);

    let err = h.orchestrator.adopt_winner(id).unwrap_err();
    assert!(matches!(err, ExperimentError::NoWinner { .. }));
}

#[test]
fn configured_no_difference_multiplier_extends_collection() {
    // With the multiplier raised far above the default, 40 near-equal
    // runs per arm (2× the minimum of 20) must not conclude.
    let config = ExperimentConfig {
        no_difference_multiplier: 1000,
        ..ExperimentConfig::default()
    };
    let h = harness_with_config(config);
    let control = make_variant(&h, "control");
    let treatment = make_variant(&h, "treatment");
    let experiment = h
        .orchestrator
        .create_experiment(new_experiment(&control.variant_id, vec![treatment.variant_id.clone()]))
        .unwrap();
    let id = experiment.experiment_id.as_str();
    h.orchestrator.start(id).unwrap();

    record_runs(&h, id, &control.variant_id, 32, 8);
    record_runs(&h, id, &treatment.variant_id, 33, 7);

    let check = h.orchestrator.conclusion_check(id).unwrap();
    assert!(!check.should_conclude);
    assert_eq!(check.reason, ConclusionReason::Collecting);
}

#[test]
fn oversized_control_weight_is_clamped() {
    let config = ExperimentConfig {
        control_weight: 150,
        ..ExperimentConfig::default()
    };
    let h = harness_with_config(config);
    let control = make_variant(&h, "control");
    let treatment = make_variant(&h, "treatment");

    let experiment = h
        .orchestrator
        .create_experiment(new_experiment(&control.variant_id, vec![treatment.variant_id.clone()]))
        .unwrap();

    let total: u32 = experiment.traffic_split.values().sum();
    assert_eq!(total, 100);
    assert_eq!(experiment.control().unwrap().weight, 100);
    assert_eq!(experiment.treatments().next().unwrap().weight, 0);
}

#[test]
fn planned_sample_size_follows_the_configured_power() {
    let default_power = harness();
    let high_power = harness_with_config(ExperimentConfig {
        default_power: 0.95,
        ..ExperimentConfig::default()
    });

    let n_default = default_power.orchestrator.plan_sample_size(0.8, 0.10);
    let n_high = high_power.orchestrator.plan_sample_size(0.8, 0.10);
    assert!(n_high > n_default, "{n_high} vs {n_default}");
}

#[test]
fn under_sampled_experiment_keeps_collecting() {
    let h = harness();
    let control = make_variant(&h, "control");
    let treatment = make_variant(&h, "treatment");
    let experiment = h
        .orchestrator
        .create_experiment(new_experiment(&control.variant_id, vec![treatment.variant_id.clone()]))
        .unwrap();
    let id = experiment.experiment_id.as_str();
    h.orchestrator.start(id).unwrap();

    record_runs(&h, id, &control.variant_id, 4, 1);
    record_runs(&h, id, &treatment.variant_id, 5, 0);

    let check = h.orchestrator.conclusion_check(id).unwrap();
    assert!(!check.should_conclude);
    assert_eq!(check.reason, ConclusionReason::Collecting);
    assert_eq!(check.recommendation, Recommendation::Continue);
}

#[test]
fn summary_includes_counts_and_analyses_while_running() {
    let h = harness();
    let control = make_variant(&h, "control");
    let treatment = make_variant(&h, "treatment");
    let experiment = h
        .orchestrator
        .create_experiment(new_experiment(&control.variant_id, vec![treatment.variant_id.clone()]))
        .unwrap();
    let id = experiment.experiment_id.as_str();

    // Draft: no statistics yet.
    let summary = h.orchestrator.experiment_summary(id).unwrap();
    assert!(summary.analyses.is_empty());

    h.orchestrator.start(id).unwrap();
    record_runs(&h, id, &control.variant_id, 3, 2);
    record_runs(&h, id, &treatment.variant_id, 4, 1);

    let summary = h.orchestrator.experiment_summary(id).unwrap();
    assert_eq!(summary.run_counts.get(&control.variant_id), Some(&5));
    assert_eq!(summary.run_counts.get(&treatment.variant_id), Some(&5));
    assert_eq!(summary.analyses.len(), 1);
    let analysis = &summary.analyses[0].analysis;
    assert_eq!(analysis.control.sample_size, 5);
    assert!((analysis.control.pass_rate - 0.6).abs() < 1e-12);
    assert_eq!(analysis.recommendation, Recommendation::Continue);
}

#[test]
fn evaluate_fix_produces_recommendation_only_when_worth_testing() {
    let h = harness();
    let fix = switchboard_core::models::fix::GeneratedFix {
        fix_id: "fix-1".to_string(),
        fix_type: VariantType::Prompt,
        target_file: "prompts/agent.md".to_string(),
        change_description: "rework the greeting".to_string(),
        change_code: "Welcome!".to_string(),
        location: None,
        confidence: 0.9,
        affected_tests: vec!["test-1".to_string(), "test-2".to_string()],
        root_cause: None,
    };
    let recommendation = h.orchestrator.evaluate_fix(&fix).unwrap();
    assert_eq!(recommendation.suggested_experiment.min_sample_size, 20);
    assert_eq!(
        recommendation.suggested_experiment.test_ids,
        vec!["test-1", "test-2"]
    );

    let skip = switchboard_core::models::fix::GeneratedFix {
        change_description: "fix typo in closing line".to_string(),
        confidence: 0.4,
        affected_tests: vec!["test-1".to_string()],
        ..fix
    };
    assert!(h.orchestrator.evaluate_fix(&skip).is_none());
}
