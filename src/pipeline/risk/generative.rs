//! Qualitative payment assessment from a local LLM.
//!
//! The assessor is advisory. Every failure is one of three kinds and all of
//! them resolve to `NEUTRAL_SCORE` in `assess`, the only place the fallback
//! is applied.

use crate::config::NEUTRAL_SCORE;
use crate::models::CodeSet;
use crate::pipeline::oracle::{sanitize_llm_output, LlmClient, OracleError};

use super::PaymentScorer;

const ASSESSOR_SYSTEM_PROMPT: &str =
    "You are a medical billing reviewer. Answer with a single number between 0 and 1 first.";

/// Why the oracle produced no usable score.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssessmentFailure {
    #[error("oracle timed out")]
    Timeout,

    #[error("oracle unreachable: {0}")]
    Unreachable(String),

    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
}

impl From<OracleError> for AssessmentFailure {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Timeout(_) => Self::Timeout,
            OracleError::ResponseParsing(msg) => Self::MalformedResponse(msg),
            other => Self::Unreachable(other.to_string()),
        }
    }
}

/// Prompt sent for one claim.
pub fn build_assessment_prompt(text: &str, codes: &CodeSet) -> String {
    format!("Risk score (0-1, high=likely paid) for claim: {text}. Codes: {codes}")
}

/// Parse the first whitespace-delimited token as a score in [0, 1].
pub fn parse_score(response: &str) -> Result<f64, AssessmentFailure> {
    let cleaned = sanitize_llm_output(response);
    let token = cleaned
        .split_whitespace()
        .next()
        .ok_or_else(|| AssessmentFailure::MalformedResponse("empty response".into()))?;

    let value: f64 = token.parse().map_err(|_| {
        AssessmentFailure::MalformedResponse(format!("first token '{token}' is not a number"))
    })?;

    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(AssessmentFailure::MalformedResponse(format!(
            "score {value} outside [0, 1]"
        )))
    }
}

pub struct GenerativeRiskAssessor<C: LlmClient> {
    client: C,
    model: String,
}

impl<C: LlmClient> GenerativeRiskAssessor<C> {
    pub fn new(client: C, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    /// Raw oracle round trip with the failure kept typed.
    pub fn try_assess(&self, text: &str, codes: &CodeSet) -> Result<f64, AssessmentFailure> {
        let prompt = build_assessment_prompt(text, codes);
        let response = self
            .client
            .generate(&self.model, &prompt, ASSESSOR_SYSTEM_PROMPT)?;
        parse_score(&response)
    }

    /// Score in [0, 1]; `NEUTRAL_SCORE` on any failure.
    pub fn assess(&self, text: &str, codes: &CodeSet) -> f64 {
        match self.try_assess(text, codes) {
            Ok(score) => score,
            Err(failure) => {
                tracing::warn!(
                    model = %self.model,
                    failure = %failure,
                    fallback = NEUTRAL_SCORE,
                    "Generative risk assessment failed, using neutral score"
                );
                NEUTRAL_SCORE
            }
        }
    }
}

impl<C: LlmClient> PaymentScorer for GenerativeRiskAssessor<C> {
    fn name(&self) -> &'static str {
        "generative"
    }

    fn score(&self, text: &str, codes: &CodeSet) -> f64 {
        self.assess(text, codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::oracle::MockLlmClient;

    /// Oracle that always fails with the given error.
    struct FailingLlm(fn() -> OracleError);

    impl LlmClient for FailingLlm {
        fn generate(&self, _: &str, _: &str, _: &str) -> Result<String, OracleError> {
            Err((self.0)())
        }
        fn is_model_available(&self, _: &str) -> Result<bool, OracleError> {
            Ok(true)
        }
        fn list_models(&self) -> Result<Vec<String>, OracleError> {
            Ok(vec![])
        }
    }

    fn diabetes_codes() -> CodeSet {
        CodeSet {
            diagnosis_codes: vec!["E11.9".into()],
            procedure_codes: vec![],
        }
    }

    #[test]
    fn prompt_contains_text_and_codes() {
        let prompt = build_assessment_prompt("diabetes check", &diabetes_codes());
        assert_eq!(
            prompt,
            "Risk score (0-1, high=likely paid) for claim: diabetes check. Codes: ICD: [E11.9] CPT: []"
        );
    }

    #[test]
    fn parses_leading_number() {
        assert_eq!(parse_score("0.85 The claim is well documented.").unwrap(), 0.85);
        assert_eq!(parse_score("  1\n").unwrap(), 1.0);
        assert_eq!(parse_score("<think>hmm</think> 0.3").unwrap(), 0.3);
    }

    #[test]
    fn rejects_non_numeric_first_token() {
        assert!(matches!(
            parse_score("Score: 0.8"),
            Err(AssessmentFailure::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_and_nan() {
        assert!(parse_score("7").is_err());
        assert!(parse_score("-0.1").is_err());
        assert!(parse_score("NaN").is_err());
    }

    #[test]
    fn empty_response_is_malformed() {
        assert!(matches!(
            parse_score("   "),
            Err(AssessmentFailure::MalformedResponse(_))
        ));
    }

    #[test]
    fn assess_returns_oracle_score() {
        let assessor = GenerativeRiskAssessor::new(MockLlmClient::new("0.9 looks fine"), "llama3");
        assert_eq!(assessor.assess("diabetes check", &diabetes_codes()), 0.9);
    }

    #[test]
    fn timeout_falls_back_to_neutral() {
        let assessor = GenerativeRiskAssessor::new(FailingLlm(|| OracleError::Timeout(60)), "llama3");
        assert_eq!(
            assessor.try_assess("x", &CodeSet::default()),
            Err(AssessmentFailure::Timeout)
        );
        assert_eq!(assessor.assess("x", &CodeSet::default()), 0.5);
    }

    #[test]
    fn unreachable_falls_back_to_neutral() {
        let assessor = GenerativeRiskAssessor::new(
            FailingLlm(|| OracleError::OllamaConnection("http://localhost:11434".into())),
            "llama3",
        );
        assert!(matches!(
            assessor.try_assess("x", &CodeSet::default()),
            Err(AssessmentFailure::Unreachable(_))
        ));
        assert_eq!(assessor.assess("x", &CodeSet::default()), 0.5);
    }

    #[test]
    fn garbage_response_falls_back_to_neutral() {
        let assessor = GenerativeRiskAssessor::new(MockLlmClient::new("I am unable to score this."), "llama3");
        assert_eq!(assessor.assess("diabetes check", &diabetes_codes()), 0.5);
    }

    #[test]
    fn empty_response_falls_back_to_neutral() {
        let assessor = GenerativeRiskAssessor::new(MockLlmClient::new(""), "llama3");
        assert_eq!(assessor.assess("diabetes check", &diabetes_codes()), 0.5);
    }

    #[test]
    fn oracle_error_mapping() {
        assert_eq!(
            AssessmentFailure::from(OracleError::ResponseParsing("eof".into())),
            AssessmentFailure::MalformedResponse("eof".into())
        );
        assert!(matches!(
            AssessmentFailure::from(OracleError::OllamaError {
                status: 500,
                body: "boom".into()
            }),
            AssessmentFailure::Unreachable(_)
        ));
    }
}
