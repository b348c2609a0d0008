//! Experimentation core configuration.

mod experiment_config;

pub use experiment_config::ExperimentConfig;
