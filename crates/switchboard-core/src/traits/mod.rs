//! Trait seams between the experimentation services and the storage layer.

pub mod storage;

pub use storage::{IExperimentStorage, IVariantStorage};
