//! Batch coordination: one pass over a collection of claims.
//!
//! ```text
//! SourcedClaim → Autocoder → RiskEngine → decide()
//!                                           ├─ Paid     → Ledger
//!                                           └─ Rejected → FeedbackSink
//! ```

pub mod feedback;
pub mod coordinator;

pub use feedback::*;
pub use coordinator::*;

use thiserror::Error;

use crate::pipeline::coding::CodingError;
use crate::pipeline::settlement::LedgerError;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Autocoding failed for {source_id}: {error}")]
    Coding {
        source_id: String,
        #[source]
        error: CodingError,
    },

    #[error("Ledger write failed for {source_id}: {error}")]
    Ledger {
        source_id: String,
        #[source]
        error: LedgerError,
    },
}

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Feedback sink lock poisoned")]
    LockPoisoned,
}
