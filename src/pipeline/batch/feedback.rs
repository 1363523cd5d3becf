//! Rejection feedback.
//!
//! A rejected claim raises a `ReviewSignal`. What happens next (human
//! recoding, future retraining) is up to the sink; the batch only emits.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CodeSet, RiskScore};

use super::FeedbackError;

/// A rejected claim queued for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSignal {
    pub batch_id: String,
    pub claim: String,
    pub claim_text: String,
    pub score: RiskScore,
    pub codes: CodeSet,
    pub timestamp: DateTime<Utc>,
}

pub trait FeedbackSink {
    fn emit(&self, signal: &ReviewSignal) -> Result<(), FeedbackError>;
}

/// Logs each rejection at INFO.
pub struct LoggingFeedbackSink;

impl FeedbackSink for LoggingFeedbackSink {
    fn emit(&self, signal: &ReviewSignal) -> Result<(), FeedbackError> {
        tracing::info!(
            batch_id = %signal.batch_id,
            claim = %signal.claim,
            score = signal.score.value(),
            codes = %signal.codes,
            "Claim rejected, queued for recoding"
        );
        Ok(())
    }
}

/// Appends one JSON object per rejection to a review queue file.
pub struct ReviewQueueSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ReviewQueueSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All queued signals, oldest first. A missing queue is empty.
    pub fn read_all(&self) -> Result<Vec<ReviewSignal>, FeedbackError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(FeedbackError::from))
            .collect()
    }
}

impl FeedbackSink for ReviewQueueSink {
    fn emit(&self, signal: &ReviewSignal) -> Result<(), FeedbackError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| FeedbackError::LockPoisoned)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(signal)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Keeps signals in memory.
#[derive(Default)]
pub struct CollectingFeedbackSink {
    signals: Mutex<Vec<ReviewSignal>>,
}

impl CollectingFeedbackSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<ReviewSignal> {
        self.signals
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl FeedbackSink for CollectingFeedbackSink {
    fn emit(&self, signal: &ReviewSignal) -> Result<(), FeedbackError> {
        self.signals
            .lock()
            .map_err(|_| FeedbackError::LockPoisoned)?
            .push(signal.clone());
        Ok(())
    }
}

/// Fans one signal out to several sinks. Every sink is tried; the first
/// error is returned.
pub struct FanOutFeedbackSink {
    sinks: Vec<Box<dyn FeedbackSink>>,
}

impl FanOutFeedbackSink {
    pub fn new(sinks: Vec<Box<dyn FeedbackSink>>) -> Self {
        Self { sinks }
    }
}

impl FeedbackSink for FanOutFeedbackSink {
    fn emit(&self, signal: &ReviewSignal) -> Result<(), FeedbackError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(signal) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
