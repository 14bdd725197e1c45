use super::{display_or_placeholder, Report, PLACEHOLDER};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use std::fmt::Write;

const HEADER: [&str; 8] = [
    "Exchange",
    "Market",
    "Funding Rate",
    "APY (%)",
    "7d Avg Rate",
    "7d Avg APY (%)",
    "Latest Rate",
    "Samples",
];

/// Renders the report as a terminal table followed by any fetch errors.
pub fn render(report: &Report) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(HEADER);

    for row in &report.rows {
        let figures = [
            display_or_placeholder(row.funding_rate, 6),
            display_or_placeholder(row.apy, 2),
            display_or_placeholder(row.avg_rate_7d, 6),
            display_or_placeholder(row.avg_apy_7d, 2),
            display_or_placeholder(row.latest_rate, 6),
            row.samples
                .map(|n| n.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        ];

        let mut cells = vec![Cell::new(&row.exchange), Cell::new(&row.symbol)];
        cells.extend(
            figures
                .into_iter()
                .map(|f| Cell::new(f).set_alignment(CellAlignment::Right)),
        );
        table.add_row(cells);
    }

    let mut out = format!(
        "Perpetual funding APY ({})\n{table}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for row in report.failures() {
        let _ = writeln!(
            out,
            "Error: {}:{}: {}",
            row.exchange,
            row.symbol,
            row.error.as_deref().unwrap_or_default()
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::mock::MockExchange;
    use crate::models::MarketId;
    use crate::report::Reporter;
    use std::time::Duration;

    #[tokio::test]
    async fn failed_rows_render_placeholders() {
        let exchange = MockExchange::new("alpha")
            .with_market("ETHUSDT", 0.0001, &[0.0001])
            .with_failing_market("FOO/BAR");
        let reporter = Reporter::new(
            vec![Box::new(exchange)],
            vec![MarketId::new("alpha", "ETHUSDT"), MarketId::new("alpha", "FOO/BAR")],
            3,
            Duration::from_secs(5),
        );

        let out = render(&reporter.collect().await);

        assert!(out.contains("0.000100"));
        assert!(out.contains("11.57"));
        let failed_line = out.lines().find(|l| l.contains("FOO/BAR") && l.contains('│')).unwrap();
        assert_eq!(failed_line.matches("N/A").count(), 6);
        assert!(out.contains("Error: alpha:FOO/BAR: alpha rejected FOO/BAR"));
    }
}
