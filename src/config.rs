use std::path::PathBuf;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "Claimwise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A claim is paid only when its risk score is strictly above this value.
pub const APPROVAL_THRESHOLD: f64 = 0.7;

/// Share of the claim value paid out; the remainder is the operator's margin.
pub const PAYOUT_RATE: f64 = 0.98;

/// Score substituted when the generative assessor cannot produce one.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Claim value used when a record carries no amount.
pub const DEFAULT_CLAIM_VALUE: f64 = 150.0;

/// Default local Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default generative model for qualitative risk assessment.
pub const DEFAULT_MODEL: &str = "llama3";

/// Oracle calls never block longer than this unless overridden.
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 60;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "claimwise=debug,claimwise_lib=debug"
    } else {
        "claimwise=info,claimwise_lib=info"
    }
}

/// Debug builds count as development.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Get the application data directory (~/Claimwise/).
///
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Persisted statistical risk model.
pub fn default_model_path() -> PathBuf {
    app_data_dir().join("risk_model.json")
}

/// Rejected claims waiting for recoding.
pub fn default_review_queue_path() -> PathBuf {
    app_data_dir().join("review_queue.jsonl")
}

/// What the batch does when entity extraction fails for one claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionFailurePolicy {
    /// Stop the whole batch; no summary is produced.
    #[default]
    AbortBatch,
    /// Record the failure against the claim and continue with the next one.
    SkipClaim,
}

/// Which entity recognition oracle backs the autocoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Deterministic phrase scanner over the code tables.
    #[default]
    Lexicon,
    /// Ollama-backed named entity recognition.
    Llm,
}

/// Runtime configuration for one processor invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub oracle_timeout_secs: u64,
    pub model_path: PathBuf,
    pub ledger_path: PathBuf,
    pub review_queue_path: PathBuf,
    pub failure_policy: ExtractionFailurePolicy,
    pub extractor: ExtractorKind,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            oracle_timeout_secs: DEFAULT_ORACLE_TIMEOUT_SECS,
            model_path: default_model_path(),
            ledger_path: PathBuf::from("paid_claims.csv"),
            review_queue_path: default_review_queue_path(),
            failure_policy: ExtractionFailurePolicy::default(),
            extractor: ExtractorKind::default(),
        }
    }
}

impl ProcessorConfig {
    /// Defaults overridden by `CLAIMWISE_OLLAMA_URL`, `CLAIMWISE_MODEL`
    /// and `CLAIMWISE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("CLAIMWISE_OLLAMA_URL") {
            config.ollama_url = url;
        }
        if let Ok(model) = std::env::var("CLAIMWISE_MODEL") {
            config.model_name = model;
        }
        if let Ok(secs) = std::env::var("CLAIMWISE_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => config.oracle_timeout_secs = secs,
                Err(_) => tracing::warn!(
                    value = %secs,
                    "Ignoring unparsable CLAIMWISE_TIMEOUT_SECS"
                ),
            }
        }
        config
    }
}
