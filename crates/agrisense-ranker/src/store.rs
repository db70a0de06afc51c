//! Durable storage for the fitted scaler/classifier pair.
//!
//! The two artifacts always travel together: a store either yields both
//! or neither, and `save` overwrites both.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use agrisense_config::ModelConfig;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::classifier::CropClassifier;
use crate::error::{RankerError, Result};
use crate::scaler::FeatureScaler;

/// Trait for persisting a fitted model pair.
///
/// Implementations can use:
/// - JSON files on local disk
/// - In-memory slots (testing)
pub trait ModelStore: Send + Sync {
    /// Load the persisted pair.
    ///
    /// Returns `Ok(None)` when nothing (or only half a pair) is stored.
    fn load(&self) -> Result<Option<(FeatureScaler, CropClassifier)>>;

    /// Persist the pair, replacing whatever was stored before.
    fn save(&self, scaler: &FeatureScaler, classifier: &CropClassifier) -> Result<()>;

    /// Short human-readable location for logs.
    fn describe(&self) -> String;
}

// ── File Implementation ─────────────────────────────────────────────────────

/// Two JSON files at fixed, paired paths.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    model_path: PathBuf,
    scaler_path: PathBuf,
}

impl FileModelStore {
    pub fn new(model_path: impl Into<PathBuf>, scaler_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            scaler_path: scaler_path.into(),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.model_path(), config.scaler_path())
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn scaler_path(&self) -> &Path {
        &self.scaler_path
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Serialise `value` into the sibling temp file of `path` and return it.
/// Nothing at `path` itself is touched.
fn stage_json<T: Serialize>(path: &Path, value: &T) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let tmp = staging_path(path);
    std::fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    Ok(tmp)
}

impl ModelStore for FileModelStore {
    fn load(&self) -> Result<Option<(FeatureScaler, CropClassifier)>> {
        match (self.model_path.exists(), self.scaler_path.exists()) {
            (false, false) => Ok(None),
            (true, true) => {
                let classifier: CropClassifier = read_json(&self.model_path)?;
                let scaler: FeatureScaler = read_json(&self.scaler_path)?;
                debug!("Read model pair from {}", self.describe());
                Ok(Some((scaler, classifier)))
            }
            (model, scaler) => {
                warn!(
                    "Incomplete model pair in {} (classifier present: {}, scaler present: {})",
                    self.describe(),
                    model,
                    scaler
                );
                Ok(None)
            }
        }
    }

    /// Both artifacts are staged before either is renamed into place, so a
    /// failed write leaves the previously saved pair intact.
    fn save(&self, scaler: &FeatureScaler, classifier: &CropClassifier) -> Result<()> {
        let scaler_tmp = stage_json(&self.scaler_path, scaler)?;
        let model_tmp = match stage_json(&self.model_path, classifier) {
            Ok(tmp) => tmp,
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_file(&scaler_tmp) {
                    debug!("Could not remove {}: {}", scaler_tmp.display(), cleanup);
                }
                return Err(e);
            }
        };

        std::fs::rename(&scaler_tmp, &self.scaler_path)?;
        std::fs::rename(&model_tmp, &self.model_path)?;
        debug!("Wrote model pair to {}", self.describe());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} + {}", self.model_path.display(), self.scaler_path.display())
    }
}

// ── In-memory Implementation for Testing ────────────────────────────────────

/// Process-local store; can be told to fail every save.
#[derive(Debug, Default)]
pub struct MemoryModelStore {
    slot: Mutex<Option<(FeatureScaler, CropClassifier)>>,
    fail_saves: bool,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `save` always errors.
    pub fn failing() -> Self {
        Self { slot: Mutex::new(None), fail_saves: true }
    }

    /// A store pre-populated with the given pair.
    pub fn with_pair(scaler: FeatureScaler, classifier: CropClassifier) -> Self {
        Self { slot: Mutex::new(Some((scaler, classifier))), fail_saves: false }
    }

    /// The currently stored pair.
    pub fn stored(&self) -> Option<(FeatureScaler, CropClassifier)> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl ModelStore for MemoryModelStore {
    fn load(&self) -> Result<Option<(FeatureScaler, CropClassifier)>> {
        let slot = self.slot.lock().map_err(|e| RankerError::Storage(e.to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, scaler: &FeatureScaler, classifier: &CropClassifier) -> Result<()> {
        if self.fail_saves {
            return Err(RankerError::Storage("memory store is read-only".into()));
        }
        let mut slot = self.slot.lock().map_err(|e| RankerError::Storage(e.to_string()))?;
        *slot = Some((scaler.clone(), classifier.clone()));
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CropClassifier;
    use ndarray::array;
    use uuid::Uuid;

    fn pair() -> (FeatureScaler, CropClassifier) {
        pair_for_run(Uuid::nil())
    }

    fn pair_for_run(run_id: Uuid) -> (FeatureScaler, CropClassifier) {
        let x = array![[10.0, 40.0, 20.0, 5.0], [30.0, 60.0, 40.0, 7.0]];
        let scaler = FeatureScaler::fit(run_id, &x).unwrap();
        let mut classifier = CropClassifier::from_parts(
            vec!["Corn".into(), "Tomato".into()],
            vec![[1.0, -1.0, -1.0, 1.0], [-1.0, 1.0, 1.0, -1.0]],
            vec![0.0, 0.0],
        );
        classifier.run_id = run_id;
        (scaler, classifier)
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path().join("saved/model.json"), dir.path().join("saved/scaler.json"));
        assert!(store.load().unwrap().is_none());

        let (scaler, classifier) = pair();
        store.save(&scaler, &classifier).unwrap();
        let (s, c) = store.load().unwrap().unwrap();
        assert_eq!(s, scaler);
        assert_eq!(c, classifier);
        assert!(!dir.path().join("saved/model.json.tmp").exists());
    }

    #[test]
    fn test_failed_classifier_write_keeps_previous_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path().join("model.json"), dir.path().join("scaler.json"));
        let (old_scaler, old_classifier) = pair_for_run(Uuid::new_v4());
        store.save(&old_scaler, &old_classifier).unwrap();

        // A directory squatting on the classifier's staging path makes that write fail.
        std::fs::create_dir(dir.path().join("model.json.tmp")).unwrap();
        let (new_scaler, new_classifier) = pair_for_run(Uuid::new_v4());
        assert!(store.save(&new_scaler, &new_classifier).is_err());

        let (s, c) = store.load().unwrap().unwrap();
        assert_eq!(s, old_scaler);
        assert_eq!(c, old_classifier);
        assert!(!dir.path().join("scaler.json.tmp").exists());
    }

    #[test]
    fn test_file_store_half_pair_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path().join("model.json"), dir.path().join("scaler.json"));
        let (scaler, classifier) = pair();
        store.save(&scaler, &classifier).unwrap();
        std::fs::remove_file(store.scaler_path()).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_unreadable_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileModelStore::new(dir.path().join("model.json"), dir.path().join("scaler.json"));
        std::fs::write(store.model_path(), b"not json").unwrap();
        std::fs::write(store.scaler_path(), b"{}").unwrap();
        assert!(matches!(store.load(), Err(RankerError::Json(_))));
    }

    #[test]
    fn test_memory_store_failing_save() {
        let store = MemoryModelStore::failing();
        let (scaler, classifier) = pair();
        assert!(matches!(store.save(&scaler, &classifier), Err(RankerError::Storage(_))));
        assert!(store.stored().is_none());
    }
}
