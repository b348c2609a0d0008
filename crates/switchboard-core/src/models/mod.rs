//! Data model for the experimentation core: variants, experiments, runs,
//! candidate fixes, and impact assessments.

pub mod assessment;
pub mod experiment;
pub mod fix;
pub mod run;
pub mod variant;
