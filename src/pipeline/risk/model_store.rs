//! Persistence for the statistical risk model.
//!
//! Loading distinguishes "nothing stored yet" (`StoredModel::Absent`) from
//! a read or decode failure, so the caller decides when to bootstrap.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ModelProvenance;

use super::classifier::LogisticRegression;
use super::features::TfidfVectorizer;
use super::RiskError;

/// Current on-disk format version.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Vectorizer and classifier, always persisted together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskModel {
    pub format_version: u32,
    pub provenance: ModelProvenance,
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
    pub vectorizer: TfidfVectorizer,
    pub classifier: LogisticRegression,
}

impl RiskModel {
    /// Structural checks before a loaded model is trusted.
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(RiskError::CorruptModel(format!(
                "unsupported format version {}",
                self.format_version
            )));
        }
        if !self.vectorizer.is_consistent() {
            return Err(RiskError::CorruptModel("inconsistent vocabulary".into()));
        }
        if self.vectorizer.len() != self.classifier.dims() {
            return Err(RiskError::CorruptModel(format!(
                "vectorizer has {} features but classifier expects {}",
                self.vectorizer.len(),
                self.classifier.dims()
            )));
        }
        Ok(())
    }
}

/// Outcome of a store lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredModel {
    Present(RiskModel),
    Absent,
}

/// Where the risk model lives between runs.
pub trait ModelStore {
    fn load(&self) -> Result<StoredModel, RiskError>;

    fn save(&self, model: &RiskModel) -> Result<(), RiskError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

/// JSON file store. Writes go to a sibling temp file and are renamed into place.
pub struct JsonFileModelStore {
    path: PathBuf,
}

impl JsonFileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelStore for JsonFileModelStore {
    fn load(&self) -> Result<StoredModel, RiskError> {
        if !self.path.exists() {
            return Ok(StoredModel::Absent);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let model: RiskModel = serde_json::from_str(&raw)?;
        model.validate()?;
        Ok(StoredModel::Present(model))
    }

    fn save(&self, model: &RiskModel) -> Result<(), RiskError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(model)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local store for tests and ephemeral runs.
#[derive(Default)]
pub struct InMemoryModelStore {
    slot: Mutex<Option<RiskModel>>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: RiskModel) -> Self {
        Self {
            slot: Mutex::new(Some(model)),
        }
    }

    pub fn snapshot(&self) -> Option<RiskModel> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl ModelStore for InMemoryModelStore {
    fn load(&self) -> Result<StoredModel, RiskError> {
        Ok(match self.snapshot() {
            Some(model) => StoredModel::Present(model),
            None => StoredModel::Absent,
        })
    }

    fn save(&self, model: &RiskModel) -> Result<(), RiskError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| RiskError::CorruptModel("in-memory store poisoned".into()))?;
        *slot = Some(model.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
