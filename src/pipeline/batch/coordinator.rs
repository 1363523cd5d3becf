//! BatchCoordinator: drives each claim through autocoding, scoring and
//! settlement, and is the only place per-claim results are aggregated.
//!
//! Claims run sequentially (one oracle call at a time). Per claim:
//! `Coded → Scored → Decided`.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ExtractionFailurePolicy;
use crate::models::{
    BatchSummary, ClaimRecord, CodeSet, RiskScore, SettlementOutcome, SourcedClaim,
    UnreadableRecord,
};
use crate::pipeline::coding::Autocoder;
use crate::pipeline::risk::{RiskBreakdown, RiskEngine};
use crate::pipeline::settlement::{decide, Ledger};

use super::feedback::{FeedbackSink, ReviewSignal};
use super::BatchError;

// ═══════════════════════════════════════════
// Per-claim state
// ═══════════════════════════════════════════

/// Lifecycle of one claim inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStage {
    Coded,
    Scored,
    Decided,
}

impl ClaimStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coded => "coded",
            Self::Scored => "scored",
            Self::Decided => "decided",
        }
    }
}

/// A claim that reached `ClaimStage::Decided`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecidedClaim {
    pub outcome: SettlementOutcome,
    pub breakdown: RiskBreakdown,
}

/// What happened to one claim.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimReport {
    Decided {
        source: String,
        outcome: SettlementOutcome,
        breakdown: RiskBreakdown,
    },
    /// The record was unreadable or autocoding failed, and the policy said
    /// to move on.
    Skipped { source: String, reason: String },
}

impl ClaimReport {
    pub fn source(&self) -> &str {
        match self {
            Self::Decided { source, .. } | Self::Skipped { source, .. } => source,
        }
    }

    /// One console line per claim.
    pub fn display_line(&self) -> String {
        match self {
            Self::Decided {
                source, outcome, ..
            } => decided_line(
                source,
                outcome.paid,
                &outcome.codes,
                outcome.score,
                outcome.paid_amount,
            ),
            Self::Skipped { source, reason } => skipped_line(source, reason),
        }
    }
}

fn decided_line(
    source: &str,
    paid: bool,
    codes: &CodeSet,
    score: RiskScore,
    paid_amount: f64,
) -> String {
    if paid {
        format!("Paid: {source} | Codes: {codes} | Score: {score} | ${paid_amount:.2}")
    } else {
        format!("Rejected (score {score}): Recoding {source}...")
    }
}

fn skipped_line(source: &str, reason: &str) -> String {
    format!("Skipped: {source} ({reason})")
}

/// Identifier shared by every record a single run produces.
pub fn new_batch_id() -> String {
    Uuid::new_v4().to_string()
}

/// Result of a completed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub batch_id: String,
    pub summary: BatchSummary,
    pub claims: Vec<ClaimReport>,
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "Batch complete: {} rejections ({} claims, {} paid, ${:.2} paid out)",
            self.summary.rejections,
            self.summary.total_claims,
            self.summary.paid,
            self.summary.total_paid_amount
        );
        if self.summary.skipped > 0 {
            line.push_str(&format!(", {} skipped", self.summary.skipped));
        }
        line
    }
}

// ═══════════════════════════════════════════
// Progress events
// ═══════════════════════════════════════════

/// Emitted while a batch runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BatchEvent {
    Started {
        batch_id: String,
        claim_count: u32,
    },
    ClaimDecided {
        completed: u32,
        total: u32,
        source: String,
        paid: bool,
        score: RiskScore,
        paid_amount: f64,
        codes: CodeSet,
    },
    ClaimSkipped {
        completed: u32,
        total: u32,
        source: String,
        reason: String,
    },
    Completed {
        total_claims: u32,
        rejections: u32,
        duration_ms: u64,
    },
}

impl BatchEvent {
    /// Console line for per-claim events.
    pub fn claim_line(&self) -> Option<String> {
        match self {
            Self::ClaimDecided {
                source,
                paid,
                score,
                paid_amount,
                codes,
                ..
            } => Some(decided_line(source, *paid, codes, *score, *paid_amount)),
            Self::ClaimSkipped { source, reason, .. } => Some(skipped_line(source, reason)),
            Self::Started { .. } | Self::Completed { .. } => None,
        }
    }
}

// ═══════════════════════════════════════════
// Coordinator
// ═══════════════════════════════════════════

/// Running counts and reports for one batch.
struct Tally<'p> {
    summary: BatchSummary,
    reports: Vec<ClaimReport>,
    total: u32,
    progress_fn: Option<&'p dyn Fn(BatchEvent)>,
}

impl Tally<'_> {
    fn skip(&mut self, completed: u32, source: &str, reason: String) {
        self.summary.skipped += 1;
        if let Some(progress) = self.progress_fn {
            progress(BatchEvent::ClaimSkipped {
                completed,
                total: self.total,
                source: source.to_string(),
                reason: reason.clone(),
            });
        }
        self.reports.push(ClaimReport::Skipped {
            source: source.to_string(),
            reason,
        });
    }
}

pub struct BatchCoordinator {
    autocoder: Autocoder,
    engine: RiskEngine,
    ledger: Box<dyn Ledger>,
    feedback: Box<dyn FeedbackSink>,
    policy: ExtractionFailurePolicy,
}

impl BatchCoordinator {
    pub fn new(
        autocoder: Autocoder,
        engine: RiskEngine,
        ledger: Box<dyn Ledger>,
        feedback: Box<dyn FeedbackSink>,
    ) -> Self {
        Self {
            autocoder,
            engine,
            ledger,
            feedback,
            policy: ExtractionFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExtractionFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Take one claim from text to a settlement decision.
    ///
    /// Side effects (ledger, feedback) happen in `run`, not here.
    pub fn process_claim(&self, claim: &SourcedClaim) -> Result<DecidedClaim, BatchError> {
        let text = &claim.claim.claim_text;

        let codes = self
            .autocoder
            .autocode(text)
            .map_err(|error| BatchError::Coding {
                source_id: claim.source.clone(),
                error,
            })?;
        tracing::debug!(
            claim = %claim.source,
            stage = ClaimStage::Coded.as_str(),
            codes = %codes
        );

        let breakdown = self.engine.score_detailed(&codes, text);
        tracing::debug!(
            claim = %claim.source,
            stage = ClaimStage::Scored.as_str(),
            score = breakdown.combined.value()
        );

        let outcome = decide(breakdown.combined, claim.claim.claim_value, codes);
        tracing::debug!(
            claim = %claim.source,
            stage = ClaimStage::Decided.as_str(),
            paid = outcome.paid
        );

        Ok(DecidedClaim { outcome, breakdown })
    }

    /// Run every claim once, in order.
    ///
    /// Under `AbortBatch` the first autocoding failure ends the run with no
    /// summary. A ledger failure always ends the run. Feedback failures are
    /// logged and do not affect the decision.
    pub fn run(
        &self,
        claims: &[SourcedClaim],
        progress_fn: Option<&dyn Fn(BatchEvent)>,
    ) -> Result<BatchReport, BatchError> {
        let entries = claims.iter().map(Result::<_, &UnreadableRecord>::Ok);
        self.run_entries(entries, claims.len(), progress_fn)
    }

    /// Run a loaded batch. Unreadable records are counted as skipped claims.
    pub fn run_records(
        &self,
        records: &[ClaimRecord],
        progress_fn: Option<&dyn Fn(BatchEvent)>,
    ) -> Result<BatchReport, BatchError> {
        let entries = records.iter().map(|record| match record {
            ClaimRecord::Claim(claim) => Ok(claim),
            ClaimRecord::Unreadable(unreadable) => Err(unreadable),
        });
        self.run_entries(entries, records.len(), progress_fn)
    }

    fn run_entries<'a>(
        &self,
        entries: impl Iterator<Item = Result<&'a SourcedClaim, &'a UnreadableRecord>>,
        count: usize,
        progress_fn: Option<&dyn Fn(BatchEvent)>,
    ) -> Result<BatchReport, BatchError> {
        let start = Instant::now();
        let total = count as u32;
        let batch_id = new_batch_id();

        tracing::info!(batch_id = %batch_id, claims = total, policy = ?self.policy, "Batch started");
        if let Some(progress) = progress_fn {
            progress(BatchEvent::Started {
                batch_id: batch_id.clone(),
                claim_count: total,
            });
        }

        let mut tally = Tally {
            summary: BatchSummary::default(),
            reports: Vec::with_capacity(count),
            total,
            progress_fn,
        };

        for (i, entry) in entries.enumerate() {
            tally.summary.total_claims += 1;
            let completed = i as u32 + 1;

            let claim = match entry {
                Ok(claim) => claim,
                Err(unreadable) => {
                    tally.skip(completed, &unreadable.source, unreadable.reason.clone());
                    continue;
                }
            };

            let DecidedClaim { outcome, breakdown } = match self.process_claim(claim) {
                Ok(decided) => decided,
                Err(e @ BatchError::Coding { .. })
                    if self.policy == ExtractionFailurePolicy::SkipClaim =>
                {
                    tracing::warn!(claim = %claim.source, error = %e, "Skipping claim");
                    tally.skip(completed, &claim.source, e.to_string());
                    continue;
                }
                Err(e) => {
                    tracing::error!(claim = %claim.source, error = %e, "Batch aborted");
                    return Err(e);
                }
            };

            if outcome.paid {
                self.ledger
                    .record_paid(&outcome)
                    .map_err(|error| BatchError::Ledger {
                        source_id: claim.source.clone(),
                        error,
                    })?;
                tally.summary.paid += 1;
                tally.summary.total_paid_amount += outcome.paid_amount;
            } else {
                tally.summary.rejections += 1;
                let signal = ReviewSignal {
                    batch_id: batch_id.clone(),
                    claim: claim.source.clone(),
                    claim_text: claim.claim.claim_text.clone(),
                    score: outcome.score,
                    codes: outcome.codes.clone(),
                    timestamp: Utc::now(),
                };
                if let Err(e) = self.feedback.emit(&signal) {
                    tracing::warn!(claim = %claim.source, error = %e, "Rejection feedback not delivered");
                }
            }

            tracing::info!(
                claim = %claim.source,
                status = outcome.status().as_str(),
                score = outcome.score.value(),
                paid_amount = outcome.paid_amount,
                "Claim settled"
            );

            if let Some(progress) = progress_fn {
                progress(BatchEvent::ClaimDecided {
                    completed,
                    total,
                    source: claim.source.clone(),
                    paid: outcome.paid,
                    score: outcome.score,
                    paid_amount: outcome.paid_amount,
                    codes: outcome.codes.clone(),
                });
            }

            tally.reports.push(ClaimReport::Decided {
                source: claim.source.clone(),
                outcome,
                breakdown,
            });
        }

        let Tally {
            summary, reports, ..
        } = tally;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            batch_id = %batch_id,
            total = summary.total_claims,
            rejections = summary.rejections,
            skipped = summary.skipped,
            duration_ms,
            "Batch complete"
        );
        if let Some(progress) = progress_fn {
            progress(BatchEvent::Completed {
                total_claims: summary.total_claims,
                rejections: summary.rejections,
                duration_ms,
            });
        }

        Ok(BatchReport {
            batch_id,
            summary,
            claims: reports,
            duration_ms,
        })
    }
}
