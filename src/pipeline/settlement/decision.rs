use crate::config::{APPROVAL_THRESHOLD, PAYOUT_RATE};
use crate::models::{CodeSet, RiskScore, SettlementOutcome};

/// Settle one claim. Paid only when the score is strictly above the threshold.
pub fn decide(score: RiskScore, claim_value: f64, codes: CodeSet) -> SettlementOutcome {
    let paid = score.value() > APPROVAL_THRESHOLD;
    let paid_amount = if paid {
        (claim_value * PAYOUT_RATE).max(0.0)
    } else {
        0.0
    };

    SettlementOutcome {
        paid,
        paid_amount,
        score,
        codes,
    }
}
