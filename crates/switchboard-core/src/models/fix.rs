//! Candidate fix types supplied by the external analysis process.

use serde::{Deserialize, Serialize};

use super::variant::VariantType;

/// A candidate fix: a proposed edit to a prompt/tool/config artifact,
/// produced by the external analysis process after test failures are
/// diagnosed. Consumed by the impact assessor and the variant store;
/// never produced by this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFix {
    pub fix_id: String,
    #[serde(rename = "type")]
    pub fix_type: VariantType,
    /// Canonical path of the artifact the fix edits.
    pub target_file: String,
    pub change_description: String,
    /// The proposed change content.
    pub change_code: String,
    pub location: Option<FixLocation>,
    /// Analysis confidence in [0, 1].
    pub confidence: f64,
    /// Test scenarios the diagnosed failure affects.
    pub affected_tests: Vec<String>,
    pub root_cause: Option<String>,
}

/// Location hints for applying a fix to its baseline content.
/// Resolution priority: section > anchor line > line number > function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixLocation {
    /// Named section of the artifact (e.g. "greeting", "booking").
    pub section: Option<String>,
    /// A line of existing content to insert after.
    pub anchor_line: Option<String>,
    /// Explicit 1-based line number to insert at.
    pub line_number: Option<u32>,
    /// Function name whose boundary the change belongs to.
    pub function: Option<String>,
}

impl FixLocation {
    /// True when no hint is present (the fix appends at end of file).
    pub fn is_empty(&self) -> bool {
        self.section.is_none()
            && self.anchor_line.is_none()
            && self.line_number.is_none()
            && self.function.is_none()
    }
}
