use super::models::ChartData;
use crate::report::{display_or_placeholder, Report, PLACEHOLDER};
use std::fmt::Write;

const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js@4";

pub const TITLE: &str = "Perpetual Futures Funding APY";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the dashboard page. Drawing the chart is left to Chart.js in
/// the browser; the page only embeds its data.
pub fn render(report: &Report) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{TITLE}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
table {{ border-collapse: collapse; }}
th, td {{ border: 1px solid #ccc; padding: 0.3rem 0.6rem; }}
td.num {{ text-align: right; font-family: monospace; }}
.error {{ color: #b00020; }}
</style>
</head>
<body>
<h1>{TITLE}</h1>
<form method="get" action="/"><button type="submit">Refresh</button></form>
<p>Generated {}</p>
"#,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for row in report.failures() {
        let _ = writeln!(
            html,
            r#"<p class="error">Error: {}:{}: {}</p>"#,
            escape(&row.exchange),
            escape(&row.symbol),
            escape(row.error.as_deref().unwrap_or_default())
        );
    }

    html.push_str(
        "<table>\n<tr><th>Exchange</th><th>Market</th><th>Funding Rate</th><th>APY (%)</th>\
         <th>7d Avg Rate</th><th>7d Avg APY (%)</th><th>Latest Rate</th><th>Samples</th></tr>\n",
    );
    for row in &report.rows {
        let samples = row
            .samples
            .map(|n| n.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let _ = writeln!(
            html,
            r#"<tr><td>{}</td><td>{}</td><td class="num">{}</td><td class="num">{}</td><td class="num">{}</td><td class="num">{}</td><td class="num">{}</td><td class="num">{}</td></tr>"#,
            escape(&row.exchange),
            escape(&row.symbol),
            display_or_placeholder(row.funding_rate, 6),
            display_or_placeholder(row.apy, 2),
            display_or_placeholder(row.avg_rate_7d, 6),
            display_or_placeholder(row.avg_apy_7d, 2),
            display_or_placeholder(row.latest_rate, 6),
            samples
        );
    }
    html.push_str("</table>\n");

    // "</" would end the script element early
    let chart = serde_json::to_string(&ChartData::from_report(report))
        .unwrap_or_else(|_| "{\"labels\":[],\"datasets\":[]}".to_string())
        .replace("</", "<\\/");

    let _ = write!(
        html,
        r#"<h2>7-day funding rate history (%)</h2>
<canvas id="history" height="120"></canvas>
<script src="{CHART_JS}"></script>
<script>
const data = {chart};
data.datasets.forEach(d => {{ d.spanGaps = true; }});
new Chart(document.getElementById("history"), {{ type: "line", data }});
</script>
</body>
</html>
"#
    );

    html
}
