//! Property tests for the apply/rollback session and the patcher.

use chrono::Utc;
use proptest::prelude::*;
use tempfile::TempDir;

use switchboard_core::models::fix::FixLocation;
use switchboard_core::models::variant::{Variant, VariantOrigin, VariantType};
use switchboard_experiments::variants::patch::apply_change;
use switchboard_experiments::ApplySession;

fn variant(target_file: &str, content: &str) -> Variant {
    Variant {
        variant_id: "v-1".to_string(),
        variant_type: VariantType::Prompt,
        target_file: target_file.to_string(),
        name: String::new(),
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

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// apply followed by rollback restores the original bytes exactly,
    /// for arbitrary original and variant content.
    #[test]
    fn rollback_round_trip(original in "\\PC{0,200}", replacement in "\\PC{0,200}") {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("agent.md"), &original).unwrap();

        let session = ApplySession::new(dir.path());
        session.apply_variant(&variant("agent.md", &replacement)).unwrap();
        session.rollback("agent.md").unwrap();

        let restored = std::fs::read_to_string(dir.path().join("agent.md")).unwrap();
        prop_assert_eq!(restored, original);
    }

    /// The patched output always contains the change content, whatever the
    /// hints resolve to.
    #[test]
    fn patch_always_carries_the_change(
        baseline in "[a-z #\n]{0,200}",
        change in "[a-z]{1,40}",
        section in proptest::option::of("[a-z]{1,10}"),
        line_number in proptest::option::of(0u32..300),
    ) {
        let location = FixLocation {
            section,
            anchor_line: None,
            line_number,
            function: None,
        };
        let patched = apply_change(&baseline, &change, Some(&location));
        prop_assert!(patched.contains(&change));
    }
}
