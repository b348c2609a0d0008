//! `VariantStore` — variant creation, baseline tracking, and permanent
//! promotion, over injected storage plus a filesystem root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use switchboard_core::errors::VariantError;
use switchboard_core::models::fix::GeneratedFix;
use switchboard_core::models::variant::{NewVariant, Variant, VariantOrigin};
use switchboard_core::traits::IVariantStorage;

use super::patch;

/// Variant creation and baseline management.
///
/// All persistence goes through the injected `IVariantStorage`; the
/// filesystem root anchors the relative `target_file` paths variants
/// version.
pub struct VariantStore {
    storage: Arc<dyn IVariantStorage>,
    root: PathBuf,
}

impl VariantStore {
    pub fn new(storage: Arc<dyn IVariantStorage>, root: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a variant from explicit input. Identical content for the
    /// same target file returns the existing record — creation is
    /// idempotent under retries.
    pub fn create_variant(&self, input: NewVariant) -> Result<Variant, VariantError> {
        let content_hash = blake3::hash(input.content.as_bytes()).to_hex().to_string();
        let variant = Variant {
            variant_id: Uuid::new_v4().to_string(),
            variant_type: input.variant_type,
            target_file: input.target_file,
            name: input.name,
            description: input.description,
            content: input.content,
            content_hash,
            baseline_variant_id: input.baseline_variant_id,
            source_fix_id: input.source_fix_id,
            is_baseline: input.is_baseline,
            created_at: Utc::now(),
            created_by: input.created_by,
            metadata: input.metadata,
        };

        let stored = self.storage.create_variant(&variant)?;
        if stored.variant_id != variant.variant_id {
            debug!(
                variant_id = %stored.variant_id,
                target_file = %stored.target_file,
                "duplicate content, returning existing variant"
            );
        }
        Ok(stored)
    }

    /// Materialize a candidate fix as a variant.
    ///
    /// Resolves the current baseline for the fix's target file — capturing
    /// the live file as an auto-generated baseline when none exists yet —
    /// then patches the fix's change into the baseline content using its
    /// location hints and stores the result linked to both the baseline
    /// and the source fix.
    pub fn create_variant_from_fix(&self, fix: &GeneratedFix) -> Result<Variant, VariantError> {
        let baseline = self.resolve_baseline(fix)?;
        let patched = patch::apply_change(&baseline.content, &fix.change_code, fix.location.as_ref());

        let variant = self.create_variant(NewVariant {
            variant_type: fix.fix_type,
            target_file: fix.target_file.clone(),
            name: format!("fix {}", fix.fix_id),
            description: fix.change_description.clone(),
            content: patched,
            baseline_variant_id: Some(baseline.variant_id.clone()),
            source_fix_id: Some(fix.fix_id.clone()),
            is_baseline: false,
            created_by: VariantOrigin::AnalysisDerived,
            metadata: None,
        })?;

        info!(
            variant_id = %variant.variant_id,
            fix_id = %fix.fix_id,
            target_file = %fix.target_file,
            "variant created from fix"
        );
        Ok(variant)
    }

    /// Current baseline for the fix's target, capturing the live file as a
    /// new baseline variant if none exists yet.
    fn resolve_baseline(&self, fix: &GeneratedFix) -> Result<Variant, VariantError> {
        if let Some(baseline) = self.storage.get_baseline(&fix.target_file)? {
            return Ok(baseline);
        }

        let path = self.root.join(&fix.target_file);
        let content =
            std::fs::read_to_string(&path).map_err(|e| VariantError::TargetFileUnreadable {
                target_file: fix.target_file.clone(),
                message: e.to_string(),
            })?;

        let captured = self.create_variant(NewVariant {
            variant_type: fix.fix_type,
            target_file: fix.target_file.clone(),
            name: format!("baseline {}", fix.target_file),
            description: "captured live content".to_string(),
            content,
            baseline_variant_id: None,
            source_fix_id: None,
            is_baseline: true,
            created_by: VariantOrigin::AutoGenerated,
            metadata: None,
        })?;
        // create_variant may have returned a pre-existing duplicate that is
        // not flagged; the flag flip below is idempotent either way.
        self.set_as_baseline(&captured.variant_id)?;
        info!(
            variant_id = %captured.variant_id,
            target_file = %fix.target_file,
            "captured live file as baseline"
        );
        self.get_variant(&captured.variant_id)
    }

    pub fn get_variant(&self, variant_id: &str) -> Result<Variant, VariantError> {
        self.storage
            .get_variant(variant_id)?
            .ok_or_else(|| VariantError::VariantNotFound {
                variant_id: variant_id.to_string(),
            })
    }

    pub fn get_baseline(&self, target_file: &str) -> Result<Option<Variant>, VariantError> {
        Ok(self.storage.get_baseline(target_file)?)
    }

    /// Version history for a target file, oldest first.
    pub fn list_variants(&self, target_file: &str) -> Result<Vec<Variant>, VariantError> {
        Ok(self.storage.list_variants_by_target(target_file)?)
    }

    /// Mark a variant as the baseline for its target file, clearing the
    /// flag from every other variant of that file.
    pub fn set_as_baseline(&self, variant_id: &str) -> Result<(), VariantError> {
        if !self.storage.set_baseline(variant_id)? {
            return Err(VariantError::VariantNotFound {
                variant_id: variant_id.to_string(),
            });
        }
        Ok(())
    }

    /// Permanent promotion: mark the variant as baseline and write its
    /// content to the live file. No original is retained — this is the
    /// commit point, not a reversible apply.
    pub fn promote(&self, variant_id: &str) -> Result<Variant, VariantError> {
        let variant = self.get_variant(variant_id)?;
        self.set_as_baseline(variant_id)?;

        let path = self.root.join(&variant.target_file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VariantError::Io {
                path: parent.display().to_string(),
                message: e.to_string(),
            })?;
        }
        std::fs::write(&path, &variant.content).map_err(|e| VariantError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        info!(
            variant_id = %variant.variant_id,
            target_file = %variant.target_file,
            "variant promoted to live baseline"
        );
        Ok(variant)
    }
}
