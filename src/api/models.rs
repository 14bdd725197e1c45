use crate::report::{FundingRow, Report};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// Response for GET /api/rates
#[derive(Serialize)]
pub struct RatesResponse {
    pub generated_at: DateTime<Utc>,
    pub failed: usize,
    pub rows: Vec<FundingRow>,
}

impl From<Report> for RatesResponse {
    fn from(report: Report) -> Self {
        Self {
            generated_at: report.generated_at,
            failed: report.failed(),
            rows: report.rows,
        }
    }
}

/// Line chart input: one label per funding timestamp and one dataset per
/// market, with gaps where a market has no payment at that time.
#[derive(Debug, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

#[derive(Debug, Serialize)]
pub struct ChartDataset {
    pub label: String,
    /// Funding rate in percent.
    pub data: Vec<Option<f64>>,
}

impl ChartData {
    pub fn from_report(report: &Report) -> Self {
        let timestamps: BTreeSet<DateTime<Utc>> = report
            .rows
            .iter()
            .flat_map(|row| row.history.samples().iter().map(|s| s.timestamp))
            .collect();

        let datasets = report
            .rows
            .iter()
            .filter(|row| !row.history.is_empty())
            .map(|row| ChartDataset {
                label: format!("{}:{}", row.exchange, row.symbol),
                data: timestamps
                    .iter()
                    .map(|ts| {
                        row.history
                            .samples()
                            .iter()
                            .find(|s| s.timestamp == *ts)
                            .map(|s| s.rate * 100.0)
                    })
                    .collect(),
            })
            .collect();

        Self {
            labels: timestamps
                .iter()
                .map(|ts| ts.format("%m-%d %H:%M").to_string())
                .collect(),
            datasets,
        }
    }
}

/// Response for GET /api/history
#[derive(Serialize)]
pub struct HistoryResponse {
    pub generated_at: DateTime<Utc>,
    pub chart: ChartData,
}
