//! Impact assessor — decides whether a candidate fix is worth an A/B
//! experiment before any variant is created.
//!
//! Pure function over the fix record. The rules are an ordered decision
//! list: the first match wins, and specificity (core-section or
//! critical-function match) outranks generic confidence thresholds.
//! Low-confidence single-test changes are never tested, so the experiment
//! budget is not spent on noise.

use switchboard_core::models::assessment::{FixImpactAssessment, ImpactLevel};
use switchboard_core::models::fix::GeneratedFix;
use switchboard_core::models::variant::VariantType;

/// Prompt sections whose edits can change call outcomes broadly.
const CORE_SECTIONS: &[&str] = &[
    "conversation flow",
    "tool usage",
    "response format",
    "transfer rules",
    "greeting",
    "booking",
    "patient identification",
    "error handling",
];

/// Tool entry points on the critical call path.
const CRITICAL_FUNCTIONS: &[&str] = &["book", "search", "create", "lookup"];

/// Keywords marking a tool fix as a configuration parameter change.
const CONFIG_KEYWORDS: &[&str] = &[
    "temperature",
    "model",
    "max tokens",
    "timeout",
    "retry",
    "config",
    "parameter",
];

/// Keywords marking a change as cosmetic.
const COSMETIC_KEYWORDS: &[&str] = &["wording", "typo", "formatting"];

/// keyword → conversation-flow tag.
const FLOW_KEYWORDS: &[(&str, &str)] = &[
    ("booking", "booking"),
    ("appointment", "booking"),
    ("schedule", "booking"),
    ("collect", "data-collection"),
    ("patient", "data-collection"),
    ("identification", "data-collection"),
    ("transfer", "transfer"),
    ("escalat", "transfer"),
    ("insurance", "insurance"),
    ("greeting", "greeting"),
    ("welcome", "greeting"),
    ("confirm", "confirmation"),
];

/// Assess a candidate fix. First matching rule decides.
pub fn assess_fix_impact(fix: &GeneratedFix) -> FixImpactAssessment {
    let haystack = search_text(fix);
    let affected_flows = affected_flows(&haystack);

    // 1. Prompt fix touching a core section.
    if fix.fix_type == VariantType::Prompt {
        if let Some(section) = matched_core_section(&haystack) {
            return assessment(
                fix,
                true,
                ImpactLevel::High,
                format!("prompt change touches core section '{section}'"),
                affected_flows,
                20,
            );
        }
    }

    // 2. Tool fix touching a critical function.
    if fix.fix_type == VariantType::Tool {
        if let Some(function) = matched_critical_function(fix, &haystack) {
            return assessment(
                fix,
                true,
                ImpactLevel::High,
                format!("tool change touches critical function '{function}'"),
                affected_flows,
                20,
            );
        }
    }

    // 3. Tool fix that is a configuration parameter change.
    if fix.fix_type == VariantType::Tool && contains_any(&haystack, CONFIG_KEYWORDS) {
        return assessment(
            fix,
            true,
            ImpactLevel::Medium,
            "tool configuration parameter change".to_string(),
            affected_flows,
            15,
        );
    }

    // 4. Prompt fix outside core sections, high confidence.
    if fix.fix_type == VariantType::Prompt && fix.confidence >= 0.7 {
        return assessment(
            fix,
            true,
            ImpactLevel::Medium,
            format!(
                "prompt change outside core sections with confidence {:.2}",
                fix.confidence
            ),
            affected_flows,
            15,
        );
    }

    // 5. Cosmetic change: test only when confidence is high.
    if contains_any(&haystack, COSMETIC_KEYWORDS) {
        if fix.confidence >= 0.8 {
            return assessment(
                fix,
                true,
                ImpactLevel::Low,
                "cosmetic change with high confidence".to_string(),
                affected_flows,
                10,
            );
        }
        return assessment(
            fix,
            false,
            ImpactLevel::Minimal,
            "cosmetic change, not worth an experiment".to_string(),
            affected_flows,
            0,
        );
    }

    // 6. Low-confidence change affecting a single test.
    if fix.affected_tests.len() == 1 && fix.confidence < 0.6 {
        return assessment(
            fix,
            false,
            ImpactLevel::Minimal,
            format!(
                "single affected test with confidence {:.2}, likely noise",
                fix.confidence
            ),
            affected_flows,
            0,
        );
    }

    // 7. Default.
    if fix.confidence >= 0.5 && fix.affected_tests.len() >= 2 {
        return assessment(
            fix,
            true,
            ImpactLevel::Medium,
            format!(
                "{} affected tests with confidence {:.2}",
                fix.affected_tests.len(),
                fix.confidence
            ),
            affected_flows,
            15,
        );
    }

    assessment(
        fix,
        false,
        ImpactLevel::Low,
        "low confidence or narrow scope, skipping experiment".to_string(),
        affected_flows,
        0,
    )
}

/// Lowercased text the keyword rules match against: section label,
/// description, and change content.
fn search_text(fix: &GeneratedFix) -> String {
    let mut text = String::new();
    if let Some(location) = &fix.location {
        if let Some(section) = &location.section {
            text.push_str(section);
            text.push(' ');
        }
        if let Some(function) = &location.function {
            text.push_str(function);
            text.push(' ');
        }
    }
    text.push_str(&fix.change_description);
    text.push(' ');
    text.push_str(&fix.change_code);
    text.to_lowercase()
}

fn matched_core_section(haystack: &str) -> Option<&'static str> {
    CORE_SECTIONS
        .iter()
        .find(|section| haystack.contains(*section))
        .copied()
}

fn matched_critical_function(fix: &GeneratedFix, haystack: &str) -> Option<&'static str> {
    let function = fix
        .location
        .as_ref()
        .and_then(|l| l.function.as_deref())
        .map(str::to_lowercase);
    CRITICAL_FUNCTIONS
        .iter()
        .find(|name| {
            function.as_deref().is_some_and(|f| f.contains(*name)) || haystack.contains(*name)
        })
        .copied()
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

fn affected_flows(haystack: &str) -> Vec<String> {
    let mut flows = Vec::new();
    for (keyword, flow) in FLOW_KEYWORDS {
        if haystack.contains(keyword) && !flows.iter().any(|f| f == flow) {
            flows.push((*flow).to_string());
        }
    }
    flows
}

fn assessment(
    fix: &GeneratedFix,
    should_test: bool,
    impact_level: ImpactLevel,
    reason: String,
    affected_flows: Vec<String>,
    suggested_min_sample_size: u32,
) -> FixImpactAssessment {
    FixImpactAssessment {
        should_test,
        impact_level,
        reason,
        affected_tests: fix.affected_tests.clone(),
        affected_flows,
        suggested_min_sample_size,
    }
}
