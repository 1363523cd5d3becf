pub mod cli;
pub mod config;
pub mod models;
pub mod pipeline;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{ExtractorKind, ProcessorConfig};
use crate::pipeline::batch::{
    BatchCoordinator, BatchError, BatchEvent, BatchReport, FanOutFeedbackSink,
    LoggingFeedbackSink, ReviewQueueSink,
};
use crate::pipeline::coding::{
    Autocoder, CodeMapper, CodingError, EntityExtractor, LexiconEntityExtractor,
    LlmEntityExtractor,
};
use crate::pipeline::import::{load_claim_dir, ImportError};
use crate::pipeline::oracle::{check_model_available, OllamaClient, OracleError};
use crate::pipeline::risk::{JsonFileModelStore, RiskEngine, RiskError};
use crate::pipeline::settlement::{compute_metrics, CsvLedger};

/// Anything that stops a processor run.
#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Coding(#[from] CodingError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Entry point for the `claimwise` binary.
pub fn run() -> Result<(), ProcessorError> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let cli = Cli::parse();
    let mut config = ProcessorConfig::from_env();
    cli.apply(&mut config);

    run_batch(&cli, &config)?;
    Ok(())
}

/// One batch pass followed by the portfolio summary.
///
/// Per-claim lines and the summary go to stdout. An aborted batch prints
/// no summary.
pub fn run_batch(cli: &Cli, config: &ProcessorConfig) -> Result<BatchReport, ProcessorError> {
    let coordinator = build_coordinator(cli, config)?;
    let records = load_claim_dir(&cli.hl7_dir, config.failure_policy)?;

    let print_claim = |event: BatchEvent| {
        if let Some(line) = event.claim_line() {
            println!("{line}");
        }
    };
    let report = coordinator.run_records(&records, Some(&print_claim))?;
    println!("{}", report.summary_line());

    match compute_metrics(&config.ledger_path, &cli.historical_csv, &report.summary) {
        Ok(metrics) => {
            println!("{}", metrics.portal_line());
            if let Some(line) = metrics.portfolio_line() {
                println!("{line}");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Portfolio summary unavailable"),
    }

    Ok(report)
}

/// Wire the autocoder, risk engine, ledger and feedback sinks from config.
pub fn build_coordinator(
    cli: &Cli,
    config: &ProcessorConfig,
) -> Result<BatchCoordinator, ProcessorError> {
    let mapper = match &cli.code_map {
        Some(path) => CodeMapper::from_json_file(path)?,
        None => CodeMapper::default(),
    };

    let extractor: Box<dyn EntityExtractor> = match config.extractor {
        ExtractorKind::Lexicon => Box::new(LexiconEntityExtractor::from_mapper(&mapper)?),
        ExtractorKind::Llm => Box::new(LlmEntityExtractor::new(
            OllamaClient::new(&config.ollama_url, config.oracle_timeout_secs)?,
            &config.model_name,
        )),
    };
    let autocoder = Autocoder::new(extractor, mapper);

    let oracle = OllamaClient::new(&config.ollama_url, config.oracle_timeout_secs)?;
    check_model_available(&oracle, &config.model_name);

    let store = JsonFileModelStore::new(&config.model_path);
    let engine = RiskEngine::with_model_store(&store, oracle, &config.model_name)?;

    let feedback = FanOutFeedbackSink::new(vec![
        Box::new(LoggingFeedbackSink),
        Box::new(ReviewQueueSink::new(&config.review_queue_path)),
    ]);

    tracing::info!(
        extractor = ?config.extractor,
        model = %config.model_name,
        ledger = %config.ledger_path.display(),
        policy = ?config.failure_policy,
        "Processor configured"
    );

    Ok(BatchCoordinator::new(
        autocoder,
        engine,
        Box::new(CsvLedger::new(&config.ledger_path)),
        Box::new(feedback),
    )
    .with_policy(config.failure_policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionFailurePolicy;
    use crate::models::ModelProvenance;
    use crate::pipeline::risk::{ModelStore, StoredModel};

    fn test_setup(dir: &std::path::Path) -> (Cli, ProcessorConfig) {
        let hl7_dir = dir.join("hl7");
        std::fs::create_dir_all(&hl7_dir).unwrap();
        let cli = Cli::try_parse_from([
            "claimwise".to_string(),
            "--hl7-dir".to_string(),
            hl7_dir.display().to_string(),
            "--historical-csv".to_string(),
            dir.join("historical_summary.csv").display().to_string(),
        ])
        .unwrap();

        let config = ProcessorConfig {
            // Port 9 is discard; nothing answers, so the generative side falls back.
            ollama_url: "http://127.0.0.1:9".to_string(),
            oracle_timeout_secs: 1,
            model_path: dir.join("risk_model.json"),
            ledger_path: dir.join("paid_claims.csv"),
            review_queue_path: dir.join("review_queue.jsonl"),
            ..ProcessorConfig::default()
        };
        (cli, config)
    }

    #[test]
    fn batch_runs_offline_with_seed_model() {
        let dir = tempfile::tempdir().unwrap();
        let (cli, config) = test_setup(dir.path());
        std::fs::write(
            cli.hl7_dir.join("a.hl7"),
            "MSH|^~\\&|CLINIC\rPV1|1|O|||||||||Diabetes follow-up office visit|||||200",
        )
        .unwrap();
        std::fs::write(cli.hl7_dir.join("b.hl7"), "PV1|1|O").unwrap();

        let report = run_batch(&cli, &config).unwrap();

        assert_eq!(report.summary.total_claims, 2);
        assert_eq!(report.summary.rejections + report.summary.paid, 2);

        let stored = JsonFileModelStore::new(&config.model_path).load().unwrap();
        assert!(matches!(
            stored,
            StoredModel::Present(ref m) if m.provenance == ModelProvenance::SeedBootstrap
        ));
    }

    #[test]
    fn missing_record_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cli, config) = test_setup(dir.path());
        cli.hl7_dir = dir.path().join("absent");

        let result = run_batch(&cli, &config);
        assert!(matches!(
            result,
            Err(ProcessorError::Import(ImportError::DirectoryNotFound(_)))
        ));
    }

    #[test]
    fn remote_ollama_url_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let (cli, mut config) = test_setup(dir.path());
        config.ollama_url = "http://claims.example.com:11434".to_string();
        config.failure_policy = ExtractionFailurePolicy::SkipClaim;

        assert!(matches!(
            build_coordinator(&cli, &config),
            Err(ProcessorError::Oracle(OracleError::Config(_)))
        ));
    }
}
