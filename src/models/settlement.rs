use serde::{Deserialize, Serialize};

use super::coding::CodeSet;
use super::enums::SettlementStatus;

/// Estimated likelihood of payment in [0, 1]; 1.0 means certain reimbursement.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(f64);

impl RiskScore {
    /// Clamp into [0, 1]. NaN maps to 0.0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for RiskScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Terminal decision for one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub paid: bool,
    pub paid_amount: f64,
    pub score: RiskScore,
    pub codes: CodeSet,
}

impl SettlementOutcome {
    pub fn status(&self) -> SettlementStatus {
        if self.paid {
            SettlementStatus::Paid
        } else {
            SettlementStatus::Rejected
        }
    }
}

/// Counts accumulated over one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_claims: u32,
    pub rejections: u32,
    pub paid: u32,
    /// Claims abandoned under the skip-and-continue failure policy.
    pub skipped: u32,
    pub total_paid_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_score_clamps_into_unit_interval() {
        assert_eq!(RiskScore::new(1.4).value(), 1.0);
        assert_eq!(RiskScore::new(-0.2).value(), 0.0);
        assert_eq!(RiskScore::new(f64::NAN).value(), 0.0);
        assert!((RiskScore::new(0.42).value() - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn risk_score_displays_two_decimals() {
        assert_eq!(RiskScore::new(0.876).to_string(), "0.88");
    }

    #[test]
    fn outcome_status_follows_paid_flag() {
        let outcome = SettlementOutcome {
            paid: false,
            paid_amount: 0.0,
            score: RiskScore::new(0.3),
            codes: CodeSet::default(),
        };
        assert_eq!(outcome.status(), SettlementStatus::Rejected);
    }

    #[test]
    fn risk_score_serializes_as_number() {
        let json = serde_json::to_string(&RiskScore::new(0.25)).unwrap();
        assert_eq!(json, "0.25");
    }
}
