//! Settlement: threshold decision, paid-claim ledger and portfolio summary.
//!
//! ```text
//! RiskScore + claim value → decide() → SettlementOutcome
//!                                         ├─ Paid     → Ledger::append
//!                                         └─ Rejected → feedback (batch)
//! ledger CSV + historical CSV → PortfolioMetrics
//! ```

pub mod decision;
pub mod ledger;
pub mod portfolio;

pub use decision::*;
pub use ledger::*;
pub use portfolio::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Only paid claims are recorded in the ledger")]
    NotPaid,

    #[error("Ledger lock poisoned")]
    LockPoisoned,
}

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read {path}: {source}")]
    Csv {
        path: std::path::PathBuf,
        #[source]
        source: csv::Error,
    },
}
