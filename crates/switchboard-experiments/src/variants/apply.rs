//! `ApplySession` — reversible variant application to live files.
//!
//! A session is owned by the caller and retains the original on-disk
//! content of every file it touches. The first apply to a file captures
//! the original; later applies reuse the retained copy, so `rollback`
//! always restores the pre-session state no matter how many variants were
//! applied in between. The retention map is behind a mutex — two appliers
//! sharing a session cannot both capture and lose an original.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use switchboard_core::errors::VariantError;
use switchboard_core::models::variant::Variant;

/// Reversible apply/rollback scope over a filesystem root.
///
/// Dropping the session without rolling back leaves applied content in
/// place; permanent promotion goes through the variant store instead.
pub struct ApplySession {
    root: PathBuf,
    /// target_file → original content. `None` means the file did not
    /// exist before the session touched it.
    retained: Mutex<HashMap<String, Option<String>>>,
}

impl ApplySession {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            retained: Mutex::new(HashMap::new()),
        }
    }

    fn resolve(&self, target_file: &str) -> PathBuf {
        self.root.join(target_file)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Option<String>>>, VariantError> {
        self.retained.lock().map_err(|_| VariantError::Io {
            path: self.root.display().to_string(),
            message: "apply session lock poisoned".to_string(),
        })
    }

    /// Write a variant's content to its target file, retaining the
    /// original content first. Retention happens at most once per file;
    /// write failures after a successful capture still leave a rollback
    /// path.
    pub fn apply_variant(&self, variant: &Variant) -> Result<(), VariantError> {
        let path = self.resolve(&variant.target_file);
        let mut retained = self.lock()?;

        if !retained.contains_key(&variant.target_file) {
            let original = read_if_exists(&path)?;
            retained.insert(variant.target_file.clone(), original);
            debug!(target_file = %variant.target_file, "retained original content");
        }

        write_file(&path, &variant.content)?;
        debug!(
            variant_id = %variant.variant_id,
            target_file = %variant.target_file,
            "variant applied"
        );
        Ok(())
    }

    /// Restore a file to its retained original and clear the retention.
    /// No-op when the session never touched the file.
    pub fn rollback(&self, target_file: &str) -> Result<(), VariantError> {
        let mut retained = self.lock()?;
        let Some(original) = retained.remove(target_file) else {
            return Ok(());
        };
        drop(retained);

        self.restore(target_file, original)
    }

    /// Restore every file the session touched.
    pub fn rollback_all(&self) -> Result<(), VariantError> {
        let entries: Vec<(String, Option<String>)> = {
            let mut retained = self.lock()?;
            retained.drain().collect()
        };
        for (target_file, original) in entries {
            self.restore(&target_file, original)?;
        }
        Ok(())
    }

    /// Files currently applied (retained and not yet rolled back).
    pub fn applied_files(&self) -> Vec<String> {
        match self.retained.lock() {
            Ok(retained) => retained.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn restore(&self, target_file: &str, original: Option<String>) -> Result<(), VariantError> {
        let path = self.resolve(target_file);
        match original {
            Some(content) => write_file(&path, &content)?,
            None => {
                // File did not exist before the session.
                if path.exists() {
                    std::fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
                }
            }
        }
        debug!(%target_file, "rolled back to original content");
        Ok(())
    }
}

fn read_if_exists(path: &Path) -> Result<Option<String>, VariantError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), VariantError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, e: std::io::Error) -> VariantError {
    VariantError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
