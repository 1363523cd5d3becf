//! Read-only portfolio summary over the paid-claim ledger and a historical
//! period CSV (`date,total_value,paid_rate`).

use std::path::Path;

use serde::Deserialize;

use crate::models::BatchSummary;

use super::ledger::read_ledger;
use super::{LedgerError, PortfolioError};

/// One historical reporting period.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoricalPeriod {
    pub date: String,
    pub total_value: f64,
    #[serde(default)]
    pub paid_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortfolioMetrics {
    /// Rows in the paid-claim ledger (all runs).
    pub paid_claims: usize,
    pub total_paid: f64,
    /// Paid share of this batch's submissions, as a percentage.
    pub acceptance_rate: Option<f64>,
    /// Mean `total_value` across historical periods.
    pub historical_average: Option<f64>,
    /// Current paid total relative to the historical average, as a percentage.
    pub growth: Option<f64>,
}

impl PortfolioMetrics {
    /// Summary line for the paid-claim ledger.
    pub fn portal_line(&self) -> String {
        let acceptance = self
            .acceptance_rate
            .map(|r| format!("{r:.1}%"))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "Portal Metrics (Today): {} paid claims | ${:.2} paid out | {} acceptance",
            self.paid_claims, self.total_paid, acceptance
        )
    }

    /// Comparison against history; `None` without historical data.
    pub fn portfolio_line(&self) -> Option<String> {
        let average = self.historical_average?;
        let growth = self
            .growth
            .map(|g| format!("{g:+.1}%"))
            .unwrap_or_else(|| "n/a".to_string());
        Some(format!(
            "Portfolio: Current ${:.2} vs. Historical Avg ${:.2} | {} growth",
            self.total_paid, average, growth
        ))
    }
}

/// Read all historical periods. A missing file yields `None`.
pub fn read_historical(path: &Path) -> Result<Option<Vec<HistoricalPeriod>>, PortfolioError> {
    if !path.exists() {
        return Ok(None);
    }
    let csv_err = |source| PortfolioError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let mut periods = Vec::new();
    for row in reader.deserialize::<HistoricalPeriod>() {
        periods.push(row.map_err(csv_err)?);
    }
    Ok(Some(periods))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Build metrics from the ledger, the historical file and this batch's counts.
pub fn compute_metrics(
    ledger_path: &Path,
    historical_path: &Path,
    batch: &BatchSummary,
) -> Result<PortfolioMetrics, PortfolioError> {
    let records = read_ledger(ledger_path).map_err(|e| match e {
        LedgerError::Csv(source) => PortfolioError::Csv {
            path: ledger_path.to_path_buf(),
            source,
        },
        LedgerError::Io(io) => PortfolioError::Io(io),
        other => PortfolioError::Io(std::io::Error::other(other.to_string())),
    })?;

    let total_paid: f64 = records.iter().map(|r| r.paid_amount).sum();
    let acceptance_rate = (batch.total_claims > 0)
        .then(|| batch.paid as f64 / batch.total_claims as f64 * 100.0);

    let historical_average = read_historical(historical_path)?
        .and_then(|periods| mean(periods.iter().map(|p| p.total_value)));
    let growth = historical_average
        .filter(|avg| *avg != 0.0)
        .map(|avg| (total_paid - avg) / avg * 100.0);

    Ok(PortfolioMetrics {
        paid_claims: records.len(),
        total_paid,
        acceptance_rate,
        historical_average,
        growth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CodeSet, RiskScore, SettlementOutcome};
    use crate::pipeline::settlement::{CsvLedger, Ledger};

    fn paid(amount: f64) -> SettlementOutcome {
        SettlementOutcome {
            paid: true,
            paid_amount: amount,
            score: RiskScore::new(0.9),
            codes: CodeSet::default(),
        }
    }

    fn batch(total: u32, paid: u32) -> BatchSummary {
        BatchSummary {
            total_claims: total,
            rejections: total - paid,
            paid,
            ..Default::default()
        }
    }

    #[test]
    fn metrics_from_ledger_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("paid_claims.csv");
        let hist_path = dir.path().join("historical_summary.csv");

        let ledger = CsvLedger::new(&ledger_path);
        ledger.record_paid(&paid(147.0)).unwrap();
        ledger.record_paid(&paid(153.0)).unwrap();
        std::fs::write(
            &hist_path,
            "date,total_value,paid_rate\n2024-01-01,200.0,0.9\n2024-02-01,400.0,0.8\n",
        )
        .unwrap();

        let metrics = compute_metrics(&ledger_path, &hist_path, &batch(3, 2)).unwrap();
        assert_eq!(metrics.paid_claims, 2);
        assert!((metrics.total_paid - 300.0).abs() < 1e-9);
        assert!((metrics.acceptance_rate.unwrap() - 66.666_666).abs() < 1e-3);
        assert_eq!(metrics.historical_average, Some(300.0));
        assert_eq!(metrics.growth, Some(0.0));

        assert_eq!(
            metrics.portal_line(),
            "Portal Metrics (Today): 2 paid claims | $300.00 paid out | 66.7% acceptance"
        );
        assert_eq!(
            metrics.portfolio_line().unwrap(),
            "Portfolio: Current $300.00 vs. Historical Avg $300.00 | +0.0% growth"
        );
    }

    #[test]
    fn missing_files_give_empty_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = compute_metrics(
            &dir.path().join("paid_claims.csv"),
            &dir.path().join("historical_summary.csv"),
            &BatchSummary::default(),
        )
        .unwrap();

        assert_eq!(metrics, PortfolioMetrics::default());
        assert!(metrics.portfolio_line().is_none());
        assert!(metrics.portal_line().ends_with("n/a acceptance"));
    }

    #[test]
    fn growth_is_relative_to_average() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("paid_claims.csv");
        let hist_path = dir.path().join("historical_summary.csv");
        CsvLedger::new(&ledger_path).record_paid(&paid(115.0)).unwrap();
        std::fs::write(&hist_path, "date,total_value,paid_rate\n2024-01-01,100.0,0.9\n").unwrap();

        let metrics = compute_metrics(&ledger_path, &hist_path, &batch(1, 1)).unwrap();
        assert!((metrics.growth.unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn zero_average_has_no_growth() {
        let dir = tempfile::tempdir().unwrap();
        let hist_path = dir.path().join("historical_summary.csv");
        std::fs::write(&hist_path, "date,total_value,paid_rate\n2024-01-01,0,0\n").unwrap();

        let metrics = compute_metrics(&dir.path().join("none.csv"), &hist_path, &batch(1, 0)).unwrap();
        assert_eq!(metrics.historical_average, Some(0.0));
        assert_eq!(metrics.growth, None);
        assert!(metrics.portfolio_line().unwrap().ends_with("n/a growth"));
    }

    #[test]
    fn malformed_history_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let hist_path = dir.path().join("historical_summary.csv");
        std::fs::write(&hist_path, "date,total_value\n2024-01-01,lots\n").unwrap();

        let result = compute_metrics(&dir.path().join("none.csv"), &hist_path, &batch(1, 1));
        assert!(matches!(result, Err(PortfolioError::Csv { .. })));
    }
}
