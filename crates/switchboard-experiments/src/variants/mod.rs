//! Variant services: the store, the apply/rollback session, and the
//! location-hint patcher.

pub mod apply;
pub mod patch;
pub mod store;
