//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ExtractionFailurePolicy, ExtractorKind, ProcessorConfig};

#[derive(Debug, Parser)]
#[command(name = "claimwise", version, about = "Local clinical claim autocoding and settlement")]
pub struct Cli {
    /// Directory of HL7 v2 claim records (*.hl7).
    #[arg(long = "hl7-dir", alias = "hl7_dir", default_value = "./data/hl7_test", value_hint = clap::ValueHint::DirPath)]
    pub hl7_dir: PathBuf,

    /// Historical portfolio summary (date,total_value,paid_rate).
    #[arg(long = "historical-csv", alias = "historical_csv", default_value = "./data/historical_summary.csv", value_hint = clap::ValueHint::FilePath)]
    pub historical_csv: PathBuf,

    /// Paid-claim ledger, appended to across runs.
    #[arg(long = "ledger", value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Persisted statistical risk model.
    #[arg(long = "model-path", value_name = "FILE")]
    pub model_path: Option<PathBuf>,

    /// Review queue for rejected claims (JSON lines).
    #[arg(long = "review-queue", value_name = "FILE")]
    pub review_queue: Option<PathBuf>,

    /// JSON code map table replacing the built-in one.
    #[arg(long = "code-map", value_name = "FILE")]
    pub code_map: Option<PathBuf>,

    /// Local Ollama endpoint.
    #[arg(long = "ollama-url")]
    pub ollama_url: Option<String>,

    /// Generative model name.
    #[arg(long = "model", short = 'm')]
    pub model: Option<String>,

    /// Oracle request timeout in seconds.
    #[arg(long = "timeout-secs")]
    pub timeout_secs: Option<u64>,

    /// Entity extractor backing the autocoder.
    #[arg(long = "extractor", value_enum)]
    pub extractor: Option<ExtractorKind>,

    /// Skip claims whose record or entity extraction fails instead of aborting the batch.
    #[arg(long = "skip-failed", default_value_t = false)]
    pub skip_failed: bool,
}

impl Cli {
    /// Layer command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut ProcessorConfig) {
        if let Some(path) = &self.ledger {
            config.ledger_path = path.clone();
        }
        if let Some(path) = &self.model_path {
            config.model_path = path.clone();
        }
        if let Some(path) = &self.review_queue {
            config.review_queue_path = path.clone();
        }
        if let Some(url) = &self.ollama_url {
            config.ollama_url = url.clone();
        }
        if let Some(model) = &self.model {
            config.model_name = model.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.oracle_timeout_secs = secs;
        }
        if let Some(kind) = self.extractor {
            config.extractor = kind;
        }
        if self.skip_failed {
            config.failure_policy = ExtractionFailurePolicy::SkipClaim;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legacy_layout() {
        let cli = Cli::try_parse_from(["claimwise"]).unwrap();
        assert_eq!(cli.hl7_dir, PathBuf::from("./data/hl7_test"));
        assert_eq!(cli.historical_csv, PathBuf::from("./data/historical_summary.csv"));
        assert!(!cli.skip_failed);

        let mut config = ProcessorConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.failure_policy, ExtractionFailurePolicy::AbortBatch);
        assert_eq!(config.extractor, ExtractorKind::Lexicon);
    }

    #[test]
    fn overrides_are_applied() {
        let cli = Cli::try_parse_from([
            "claimwise",
            "--hl7-dir",
            "/tmp/claims",
            "--ledger",
            "/tmp/paid.csv",
            "--model",
            "medgemma:4b",
            "--timeout-secs",
            "5",
            "--extractor",
            "llm",
            "--skip-failed",
        ])
        .unwrap();

        let mut config = ProcessorConfig::default();
        cli.apply(&mut config);
        assert_eq!(cli.hl7_dir, PathBuf::from("/tmp/claims"));
        assert_eq!(config.ledger_path, PathBuf::from("/tmp/paid.csv"));
        assert_eq!(config.model_name, "medgemma:4b");
        assert_eq!(config.oracle_timeout_secs, 5);
        assert_eq!(config.extractor, ExtractorKind::Llm);
        assert_eq!(config.failure_policy, ExtractionFailurePolicy::SkipClaim);
    }

    #[test]
    fn underscore_aliases_accepted() {
        let cli = Cli::try_parse_from(["claimwise", "--hl7_dir", "d", "--historical_csv", "h.csv"])
            .unwrap();
        assert_eq!(cli.hl7_dir, PathBuf::from("d"));
        assert_eq!(cli.historical_csv, PathBuf::from("h.csv"));
    }

    #[test]
    fn unknown_extractor_is_rejected() {
        assert!(Cli::try_parse_from(["claimwise", "--extractor", "bert"]).is_err());
    }
}
