mod api;
mod apy;
mod config;
mod errors;
mod exchanges;
mod models;
mod report;

use api::ApiServer;
use clap::{Parser, ValueEnum};
use config::Config;
use report::Reporter;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Annualized yield of perpetual futures funding rates across exchanges.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print a table once, or serve the dashboard.
    #[arg(long, value_enum, default_value_t = Mode::Cli)]
    mode: Mode,

    /// Markets to watch as exchange:SYMBOL pairs (overrides MARKETS).
    #[arg(long)]
    markets: Option<String>,

    /// Funding payments per day (overrides FUNDING_PERIODS_PER_DAY).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    periods_per_day: Option<u32>,

    /// Per-market fetch timeout in seconds (overrides FETCH_TIMEOUT_SECS).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Dashboard port (overrides API_PORT).
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Cli,
    Dashboard,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // stdout is reserved for the table
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

impl Cli {
    fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(raw) = &self.markets {
            config.markets = Config::parse_markets(raw)?;
        }
        if let Some(n) = self.periods_per_day {
            config.periods_per_day = n;
        }
        if let Some(secs) = self.timeout_secs {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(port) = self.port {
            config.api_port = port;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::from_env()?;
    cli.apply(&mut config)?;

    let reporter = Reporter::from_config(&config)?;

    tracing::info!(
        "fundscope starting in {:?} mode, markets: {}",
        cli.mode,
        reporter
            .markets()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    match cli.mode {
        Mode::Cli => {
            let report = reporter.collect().await;
            println!("{}", report::table::render(&report));
        }
        Mode::Dashboard => ApiServer::new(reporter).run(&config).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_mode_is_default() {
        let cli = Cli::try_parse_from(["fundscope"]).unwrap();
        assert_eq!(cli.mode, Mode::Cli);
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "fundscope",
            "--mode",
            "dashboard",
            "--markets",
            "bybit:BTCUSDT",
            "--periods-per-day",
            "24",
            "--timeout-secs",
            "3",
            "--port",
            "8080",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::Dashboard);

        let mut config = Config::default();
        cli.apply(&mut config).unwrap();
        assert_eq!(config.markets.len(), 1);
        assert_eq!(config.markets[0].exchange, "bybit");
        assert_eq!(config.periods_per_day, 24);
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.api_port, 8080);
    }

    #[test]
    fn zero_periods_rejected() {
        assert!(Cli::try_parse_from(["fundscope", "--periods-per-day", "0"]).is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["fundscope", "--timeout-secs", "0"]).is_err());
        assert!(Cli::try_parse_from(["fundscope", "--timeout-secs", "1"]).is_ok());
    }
}
