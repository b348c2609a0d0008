//! Integration tests for the SQLite storage engine.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use switchboard_core::models::experiment::{
    Experiment, ExperimentStatus, ExperimentType, ExperimentVariant, VariantRole,
};
use switchboard_core::models::run::{ExperimentRun, RunMetrics};
use switchboard_core::models::variant::{Variant, VariantOrigin, VariantType};
use switchboard_core::traits::{IExperimentStorage, IVariantStorage};
use switchboard_storage::SwitchboardStorageEngine;

fn engine() -> SwitchboardStorageEngine {
    SwitchboardStorageEngine::open_in_memory().unwrap()
}

fn make_variant(target_file: &str, content: &str) -> Variant {
    Variant {
        variant_id: Uuid::new_v4().to_string(),
        variant_type: VariantType::Prompt,
        target_file: target_file.to_string(),
        name: "test variant".to_string(),
        description: String::new(),
        content: content.to_string(),
        content_hash: blake3::hash(content.as_bytes()).to_hex().to_string(),
        baseline_variant_id: None,
        source_fix_id: None,
        is_baseline: false,
        created_at: Utc::now(),
        created_by: VariantOrigin::Manual,
        metadata: None,
    }
}

fn make_experiment(control_id: &str, treatment_id: &str) -> Experiment {
    let mut traffic_split = BTreeMap::new();
    traffic_split.insert(control_id.to_string(), 50);
    traffic_split.insert(treatment_id.to_string(), 50);
    Experiment {
        experiment_id: Uuid::new_v4().to_string(),
        name: "greeting rewrite".to_string(),
        description: String::new(),
        hypothesis: "shorter greeting improves pass rate".to_string(),
        status: ExperimentStatus::Draft,
        experiment_type: ExperimentType::Prompt,
        variants: vec![
            ExperimentVariant {
                variant_id: control_id.to_string(),
                role: VariantRole::Control,
                weight: 50,
            },
            ExperimentVariant {
                variant_id: treatment_id.to_string(),
                role: VariantRole::Treatment,
                weight: 50,
            },
        ],
        test_ids: vec!["test-1".to_string(), "test-2".to_string()],
        traffic_split,
        min_sample_size: 20,
        max_sample_size: 100,
        significance_threshold: 0.05,
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
        winning_variant_id: None,
        conclusion: None,
    }
}

fn make_run(experiment_id: &str, variant_id: &str, role: VariantRole, passed: bool) -> ExperimentRun {
    ExperimentRun {
        experiment_id: experiment_id.to_string(),
        run_id: Uuid::new_v4().to_string(),
        test_id: "test-1".to_string(),
        variant_id: variant_id.to_string(),
        variant_role: role,
        recorded_at: Utc::now(),
        passed,
        turn_count: 8,
        duration_ms: 42_000,
        goal_completion_rate: if passed { 1.0 } else { 0.5 },
        constraint_violations: 0,
        error_occurred: false,
        metrics: RunMetrics {
            goals_completed: Some(if passed { 3 } else { 1 }),
            goals_total: Some(3),
            avg_turn_duration_ms: Some(5_250.0),
            issues_detected: Some(0),
            error_count: 0,
            tokens_used: Some(1_200),
            cost_usd: Some(0.018),
        },
    }
}

#[test]
fn variant_round_trip() {
    let engine = engine();
    let variant = make_variant("prompts/agent.md", "You are a scheduling agent.");
    let stored = engine.create_variant(&variant).unwrap();
    assert_eq!(stored.variant_id, variant.variant_id);

    let fetched = engine.get_variant(&variant.variant_id).unwrap().unwrap();
    assert_eq!(fetched.content, variant.content);
    assert_eq!(fetched.content_hash, variant.content_hash);
    assert_eq!(fetched.variant_type, VariantType::Prompt);
    assert_eq!(fetched.created_by, VariantOrigin::Manual);
}

#[test]
fn duplicate_content_returns_existing_variant() {
    let engine = engine();
    let first = make_variant("prompts/agent.md", "identical content");
    let second = make_variant("prompts/agent.md", "identical content");
    assert_ne!(first.variant_id, second.variant_id);

    let stored_first = engine.create_variant(&first).unwrap();
    let stored_second = engine.create_variant(&second).unwrap();

    // Same content hash for the same target resolves to the first record.
    assert_eq!(stored_second.variant_id, stored_first.variant_id);
    assert_eq!(
        engine
            .list_variants_by_target("prompts/agent.md")
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn same_content_different_target_is_distinct() {
    let engine = engine();
    let a = make_variant("prompts/a.md", "shared content");
    let b = make_variant("prompts/b.md", "shared content");

    let stored_a = engine.create_variant(&a).unwrap();
    let stored_b = engine.create_variant(&b).unwrap();
    assert_ne!(stored_a.variant_id, stored_b.variant_id);
}

#[test]
fn baseline_flag_is_exclusive_per_target() {
    let engine = engine();
    let v1 = engine
        .create_variant(&make_variant("prompts/agent.md", "version one"))
        .unwrap();
    let v2 = engine
        .create_variant(&make_variant("prompts/agent.md", "version two"))
        .unwrap();

    assert!(engine.set_baseline(&v1.variant_id).unwrap());
    assert_eq!(
        engine.get_baseline("prompts/agent.md").unwrap().unwrap().variant_id,
        v1.variant_id
    );

    assert!(engine.set_baseline(&v2.variant_id).unwrap());
    let baseline = engine.get_baseline("prompts/agent.md").unwrap().unwrap();
    assert_eq!(baseline.variant_id, v2.variant_id);

    // Only one baseline survives the flip.
    let flagged = engine
        .list_variants_by_target("prompts/agent.md")
        .unwrap()
        .into_iter()
        .filter(|v| v.is_baseline)
        .count();
    assert_eq!(flagged, 1);
}

#[test]
fn set_baseline_unknown_variant_is_false() {
    let engine = engine();
    assert!(!engine.set_baseline("no-such-variant").unwrap());
}

#[test]
fn experiment_round_trip() {
    let engine = engine();
    let experiment = make_experiment("var-control", "var-treatment");
    engine.insert_experiment(&experiment).unwrap();

    let fetched = engine
        .get_experiment(&experiment.experiment_id)
        .unwrap()
        .unwrap();
    assert_eq!(fetched.status, ExperimentStatus::Draft);
    assert_eq!(fetched.variants.len(), 2);
    assert_eq!(fetched.control().unwrap().variant_id, "var-control");
    assert_eq!(fetched.traffic_split.values().sum::<u32>(), 100);
    assert_eq!(fetched.test_ids, vec!["test-1", "test-2"]);
}

#[test]
fn transition_is_guarded_by_current_status() {
    let engine = engine();
    let experiment = make_experiment("c", "t");
    engine.insert_experiment(&experiment).unwrap();
    let id = experiment.experiment_id.as_str();

    // draft → running sets started_at.
    assert!(engine
        .transition_status(
            id,
            &[ExperimentStatus::Draft, ExperimentStatus::Paused],
            ExperimentStatus::Running,
        )
        .unwrap());
    let running = engine.get_experiment(id).unwrap().unwrap();
    assert_eq!(running.status, ExperimentStatus::Running);
    assert!(running.started_at.is_some());
    assert!(running.completed_at.is_none());

    // A second start attempt finds no draft/paused row.
    assert!(!engine
        .transition_status(
            id,
            &[ExperimentStatus::Draft, ExperimentStatus::Paused],
            ExperimentStatus::Running,
        )
        .unwrap());

    // running → completed sets completed_at and preserves started_at.
    assert!(engine
        .transition_status(id, &[ExperimentStatus::Running], ExperimentStatus::Completed)
        .unwrap());
    let done = engine.get_experiment(id).unwrap().unwrap();
    assert_eq!(done.status, ExperimentStatus::Completed);
    assert_eq!(done.started_at, running.started_at);
    assert!(done.completed_at.is_some());

    // Terminal: nothing moves a completed experiment.
    assert!(!engine
        .transition_status(
            id,
            &[
                ExperimentStatus::Draft,
                ExperimentStatus::Running,
                ExperimentStatus::Paused,
            ],
            ExperimentStatus::Aborted,
        )
        .unwrap());
}

#[test]
fn pause_and_resume_keep_original_started_at() {
    let engine = engine();
    let experiment = make_experiment("c", "t");
    engine.insert_experiment(&experiment).unwrap();
    let id = experiment.experiment_id.as_str();

    engine
        .transition_status(id, &[ExperimentStatus::Draft], ExperimentStatus::Running)
        .unwrap();
    let first_start = engine.get_experiment(id).unwrap().unwrap().started_at;

    engine
        .transition_status(id, &[ExperimentStatus::Running], ExperimentStatus::Paused)
        .unwrap();
    engine
        .transition_status(id, &[ExperimentStatus::Paused], ExperimentStatus::Running)
        .unwrap();

    let resumed = engine.get_experiment(id).unwrap().unwrap();
    assert_eq!(resumed.status, ExperimentStatus::Running);
    assert_eq!(resumed.started_at, first_start);
}

#[test]
fn outcome_round_trip() {
    let engine = engine();
    let experiment = make_experiment("c", "t");
    engine.insert_experiment(&experiment).unwrap();

    engine
        .set_outcome(&experiment.experiment_id, Some("t"), "treatment wins")
        .unwrap();
    let fetched = engine
        .get_experiment(&experiment.experiment_id)
        .unwrap()
        .unwrap();
    assert_eq!(fetched.winning_variant_id.as_deref(), Some("t"));
    assert_eq!(fetched.conclusion.as_deref(), Some("treatment wins"));
}

#[test]
fn runs_are_scoped_and_counted_per_variant() {
    let engine = engine();
    let experiment = make_experiment("c", "t");
    engine.insert_experiment(&experiment).unwrap();
    let id = experiment.experiment_id.as_str();

    for _ in 0..3 {
        engine
            .insert_run(&make_run(id, "c", VariantRole::Control, true))
            .unwrap();
    }
    for _ in 0..2 {
        engine
            .insert_run(&make_run(id, "t", VariantRole::Treatment, false))
            .unwrap();
    }

    assert_eq!(engine.get_runs(id).unwrap().len(), 5);
    assert_eq!(engine.get_runs_by_variant(id, "c").unwrap().len(), 3);
    assert_eq!(engine.get_runs_by_variant(id, "t").unwrap().len(), 2);

    let counts = engine.count_runs_by_variant(id).unwrap();
    assert_eq!(counts, vec![("c".to_string(), 3), ("t".to_string(), 2)]);
}

#[test]
fn run_metrics_round_trip() {
    let engine = engine();
    let experiment = make_experiment("c", "t");
    engine.insert_experiment(&experiment).unwrap();

    let run = make_run(&experiment.experiment_id, "c", VariantRole::Control, true);
    engine.insert_run(&run).unwrap();

    let fetched = &engine.get_runs(&experiment.experiment_id).unwrap()[0];
    assert_eq!(fetched.run_id, run.run_id);
    assert_eq!(fetched.variant_role, VariantRole::Control);
    assert!(fetched.passed);
    assert_eq!(fetched.metrics.goals_completed, Some(3));
    assert_eq!(fetched.metrics.tokens_used, Some(1_200));
    assert!((fetched.metrics.cost_usd.unwrap() - 0.018).abs() < 1e-12);
}

#[test]
fn file_backed_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("switchboard.db");

    let variant = make_variant("prompts/agent.md", "persisted content");
    {
        let engine = SwitchboardStorageEngine::open(&path).unwrap();
        engine.create_variant(&variant).unwrap();
        engine.checkpoint().unwrap();
    }

    let reopened = SwitchboardStorageEngine::open(&path).unwrap();
    let fetched = reopened.get_variant(&variant.variant_id).unwrap().unwrap();
    assert_eq!(fetched.content, "persisted content");
}
