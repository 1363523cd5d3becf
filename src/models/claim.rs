use serde::{Deserialize, Serialize};

/// One billable clinical encounter, as produced by the record parser.
///
/// Defaults for sparse records are applied at parse time; downstream code
/// never checks for missing content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalClaim {
    pub claim_text: String,
    pub claim_value: f64,
}

impl ClinicalClaim {
    pub fn new(claim_text: impl Into<String>, claim_value: f64) -> Self {
        Self {
            claim_text: claim_text.into(),
            claim_value,
        }
    }
}

/// A claim tagged with where it came from (file name, queue id, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedClaim {
    pub source: String,
    pub claim: ClinicalClaim,
}

/// A record that could not be read into a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreadableRecord {
    pub source: String,
    pub reason: String,
}

/// One loaded record, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimRecord {
    Claim(SourcedClaim),
    Unreadable(UnreadableRecord),
}

impl ClaimRecord {
    pub fn source(&self) -> &str {
        match self {
            Self::Claim(claim) => &claim.source,
            Self::Unreadable(record) => &record.source,
        }
    }

    pub fn as_claim(&self) -> Option<&SourcedClaim> {
        match self {
            Self::Claim(claim) => Some(claim),
            Self::Unreadable(_) => None,
        }
    }
}
