use crate::models::{CodeSet, RiskScore};
use crate::pipeline::oracle::LlmClient;

use super::generative::GenerativeRiskAssessor;
use super::model_store::ModelStore;
use super::statistical::StatisticalRiskClassifier;
use super::{PaymentScorer, RiskError};

/// Per-scorer contributions to one ensemble score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskBreakdown {
    pub statistical: f64,
    pub generative: f64,
    pub combined: RiskScore,
}

/// Unweighted mean of the two sub-scores, each clamped first.
pub fn combine(statistical: f64, generative: f64) -> RiskScore {
    let s = RiskScore::new(statistical).value();
    let g = RiskScore::new(generative).value();
    RiskScore::new((s + g) / 2.0)
}

/// Ensemble of a statistical and a generative scorer.
pub struct RiskEngine {
    statistical: Box<dyn PaymentScorer>,
    generative: Box<dyn PaymentScorer>,
}

impl RiskEngine {
    pub fn new(statistical: Box<dyn PaymentScorer>, generative: Box<dyn PaymentScorer>) -> Self {
        Self {
            statistical,
            generative,
        }
    }

    /// Statistical side loaded (or bootstrapped) from `store`, generative
    /// side backed by `client`.
    pub fn with_model_store<C: LlmClient + 'static>(
        store: &dyn ModelStore,
        client: C,
        model: &str,
    ) -> Result<Self, RiskError> {
        let statistical = StatisticalRiskClassifier::load_or_bootstrap(store)?;
        Ok(Self::new(
            Box::new(statistical),
            Box::new(GenerativeRiskAssessor::new(client, model)),
        ))
    }

    pub fn score(&self, codes: &CodeSet, text: &str) -> RiskScore {
        self.score_detailed(codes, text).combined
    }

    pub fn score_detailed(&self, codes: &CodeSet, text: &str) -> RiskBreakdown {
        let statistical = self.statistical.score(text, codes);
        let generative = self.generative.score(text, codes);
        let combined = combine(statistical, generative);

        tracing::debug!(
            statistical_scorer = self.statistical.name(),
            generative_scorer = self.generative.name(),
            statistical,
            generative,
            combined = combined.value(),
            "Risk scored"
        );

        RiskBreakdown {
            statistical,
            generative,
            combined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelProvenance;
    use crate::pipeline::oracle::MockLlmClient;
    use crate::pipeline::risk::{FixedScorer, InMemoryModelStore};

    fn engine(statistical: f64, generative: f64) -> RiskEngine {
        RiskEngine::new(
            Box::new(FixedScorer(statistical)),
            Box::new(FixedScorer(generative)),
        )
    }

    #[test]
    fn agreeing_high_scores_pass_through() {
        let score = engine(0.9, 0.9).score(&CodeSet::default(), "diabetes check");
        assert!((score.value() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn agreeing_low_scores_pass_through() {
        let score = engine(0.4, 0.4).score(&CodeSet::default(), "high risk procedure");
        assert!((score.value() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn score_is_unweighted_mean() {
        let breakdown = engine(0.2, 0.8).score_detailed(&CodeSet::default(), "x");
        assert_eq!(breakdown.statistical, 0.2);
        assert_eq!(breakdown.generative, 0.8);
        assert!((breakdown.combined.value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_sub_scores_are_clamped() {
        assert_eq!(combine(1.5, 1.0).value(), 1.0);
        assert_eq!(combine(-3.0, 0.0).value(), 0.0);
        assert_eq!(combine(f64::NAN, 1.0).value(), 0.5);
    }

    #[test]
    fn with_model_store_bootstraps_and_uses_oracle() {
        let store = InMemoryModelStore::new();
        let engine =
            RiskEngine::with_model_store(&store, MockLlmClient::new("not a number"), "llama3")
                .unwrap();

        assert_eq!(
            store.snapshot().map(|m| m.provenance),
            Some(ModelProvenance::SeedBootstrap)
        );

        let breakdown = engine.score_detailed(&CodeSet::default(), "routine visit");
        assert_eq!(breakdown.generative, 0.5);
        assert!((0.0..=1.0).contains(&breakdown.combined.value()));
    }
}
