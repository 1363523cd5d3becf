//! Statistical payment-likelihood classifier.
//!
//! The seed bootstrap only makes the processor runnable on a fresh machine.
//! Three hand-written rows are not a training set; a seed model is flagged
//! with `ModelProvenance::SeedBootstrap` and warned about on every load.

use chrono::Utc;

use crate::models::{CodeSet, ModelProvenance};

use super::classifier::{LogisticRegression, DEFAULT_C};
use super::features::{TfidfVectorizer, DEFAULT_MAX_FEATURES};
use super::model_store::{ModelStore, RiskModel, StoredModel, MODEL_FORMAT_VERSION};
use super::{feature_text, PaymentScorer, RiskError};

/// One labelled historical claim.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub text: String,
    pub codes: CodeSet,
    pub paid: bool,
}

impl TrainingSample {
    fn new(text: &str, diagnosis: &[&str], procedure: &[&str], paid: bool) -> Self {
        Self {
            text: text.to_string(),
            codes: CodeSet {
                diagnosis_codes: diagnosis.iter().map(|c| c.to_string()).collect(),
                procedure_codes: procedure.iter().map(|c| c.to_string()).collect(),
            },
            paid,
        }
    }
}

/// Fixed seed rows used when no model has been persisted.
pub fn seed_samples() -> Vec<TrainingSample> {
    vec![
        TrainingSample::new("diabetes check", &["E11.9"], &[], true),
        TrainingSample::new("routine visit", &[], &["99213"], true),
        TrainingSample::new("high risk procedure", &[], &["Unmapped"], false),
    ]
}

/// Fit vectorizer and classifier on `samples`.
pub fn train_model(
    samples: &[TrainingSample],
    provenance: ModelProvenance,
) -> Result<RiskModel, RiskError> {
    if samples.is_empty() {
        return Err(RiskError::EmptyTrainingSet);
    }

    let documents: Vec<String> = samples
        .iter()
        .map(|s| feature_text(&s.text, &s.codes))
        .collect();
    let vectorizer = TfidfVectorizer::fit(&documents, DEFAULT_MAX_FEATURES);
    let rows: Vec<Vec<f64>> = documents.iter().map(|d| vectorizer.transform(d)).collect();
    let labels: Vec<bool> = samples.iter().map(|s| s.paid).collect();
    let classifier = LogisticRegression::fit(&rows, &labels, DEFAULT_C)?;

    Ok(RiskModel {
        format_version: MODEL_FORMAT_VERSION,
        provenance,
        trained_at: Utc::now(),
        training_samples: samples.len(),
        vectorizer,
        classifier,
    })
}

/// Train the seed model.
pub fn bootstrap_model() -> Result<RiskModel, RiskError> {
    train_model(&seed_samples(), ModelProvenance::SeedBootstrap)
}

/// Trained classifier over (text, codes). Loaded once and read-only afterwards.
pub struct StatisticalRiskClassifier {
    model: RiskModel,
}

impl StatisticalRiskClassifier {
    pub fn from_model(model: RiskModel) -> Self {
        if model.provenance == ModelProvenance::SeedBootstrap {
            tracing::warn!(
                samples = model.training_samples,
                "Statistical risk model is the seed bootstrap, not trained on claim history; \
                 its scores are placeholders"
            );
        }
        Self { model }
    }

    /// Load the persisted model, or bootstrap and persist the seed model.
    ///
    /// An unreadable store is logged and replaced by a fresh seed model; a
    /// failed save leaves the model in memory only. Errors only if the seed
    /// model itself cannot be trained.
    pub fn load_or_bootstrap(store: &dyn ModelStore) -> Result<Self, RiskError> {
        match store.load() {
            Ok(StoredModel::Present(model)) => {
                tracing::info!(
                    store = %store.describe(),
                    provenance = model.provenance.as_str(),
                    trained_at = %model.trained_at,
                    "Loaded statistical risk model"
                );
                return Ok(Self::from_model(model));
            }
            Ok(StoredModel::Absent) => {
                tracing::info!(store = %store.describe(), "No risk model stored, bootstrapping seed model");
            }
            Err(e) => {
                tracing::warn!(
                    store = %store.describe(),
                    error = %e,
                    "Stored risk model unusable, bootstrapping seed model"
                );
            }
        }

        let model = bootstrap_model()?;
        if let Err(e) = store.save(&model) {
            tracing::warn!(store = %store.describe(), error = %e, "Could not persist seed risk model");
        }
        Ok(Self::from_model(model))
    }

    pub fn model(&self) -> &RiskModel {
        &self.model
    }

    pub fn provenance(&self) -> ModelProvenance {
        self.model.provenance
    }

    /// Probability of payment in [0, 1].
    pub fn predict(&self, text: &str, codes: &CodeSet) -> f64 {
        let features = self.model.vectorizer.transform(&feature_text(text, codes));
        self.model.classifier.predict_proba(&features).clamp(0.0, 1.0)
    }
}

impl PaymentScorer for StatisticalRiskClassifier {
    fn name(&self) -> &'static str {
        "statistical"
    }

    fn score(&self, text: &str, codes: &CodeSet) -> f64 {
        self.predict(text, codes)
    }
}
