//! Payment-likelihood scoring.
//!
//! Two independent scorers feed one ensemble:
//! ```text
//! (text, codes) ─┬─ StatisticalRiskClassifier (TF-IDF + logistic regression)
//!                └─ GenerativeRiskAssessor    (local LLM, 0.5 on any failure)
//!                        ↓
//!                    RiskEngine → RiskScore (unweighted mean)
//! ```

pub mod features;
pub mod classifier;
pub mod model_store;
pub mod statistical;
pub mod generative;
pub mod engine;

pub use features::*;
pub use classifier::*;
pub use model_store::*;
pub use statistical::*;
pub use generative::*;
pub use engine::*;

use thiserror::Error;

use crate::models::CodeSet;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persisted model is unusable: {0}")]
    CorruptModel(String),

    #[error("Cannot train on an empty training set")]
    EmptyTrainingSet,
}

/// A source of payment likelihood in [0, 1].
///
/// Implementations never fail: recoverable problems are absorbed into the
/// returned score.
pub trait PaymentScorer {
    fn name(&self) -> &'static str;

    fn score(&self, text: &str, codes: &CodeSet) -> f64;
}

/// Constant scorer for stubbing one side of the ensemble.
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer(pub f64);

impl PaymentScorer for FixedScorer {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn score(&self, _text: &str, _codes: &CodeSet) -> f64 {
        self.0
    }
}

/// Text the statistical model sees for one claim.
pub fn feature_text(text: &str, codes: &CodeSet) -> String {
    format!("{text} {}", codes.render())
}
