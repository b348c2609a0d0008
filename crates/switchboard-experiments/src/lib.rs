//! # switchboard-experiments
//!
//! The experimentation services: impact assessment of candidate fixes,
//! variant storage with safe apply/rollback, and the A/B experiment
//! orchestrator. Storage is injected via the `switchboard-core` traits;
//! statistics come from `switchboard-stats`.

pub mod assessor;
pub mod orchestrator;
pub mod variants;

pub use assessor::assess_fix_impact;
pub use orchestrator::{ExperimentOrchestrator, ExperimentSummary, NewExperiment, SelectedVariant};
pub use variants::apply::ApplySession;
pub use variants::store::VariantStore;
