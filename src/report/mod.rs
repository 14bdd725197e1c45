pub mod table;

use crate::apy::calculate_apy;
use crate::config::Config;
use crate::errors::{ConfigError, ExchangeError};
use crate::exchanges::{self, Exchange};
use crate::models::{FundingRateHistory, FundingRateSample, MarketId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Shown in place of any figure that could not be fetched.
pub const PLACEHOLDER: &str = "N/A";

/// Formats `value` with `decimals` places, or the placeholder when missing.
pub fn display_or_placeholder(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Funding figures for one market. Every figure is `None` when the
/// market could not be fetched, and `error` says why.
#[derive(Debug, Clone, Serialize)]
pub struct FundingRow {
    pub exchange: String,
    pub symbol: String,
    pub funding_rate: Option<f64>,
    pub apy: Option<f64>,
    pub avg_rate_7d: Option<f64>,
    pub avg_apy_7d: Option<f64>,
    pub latest_rate: Option<f64>,
    pub samples: Option<usize>,
    pub error: Option<String>,

    #[serde(skip)]
    pub history: FundingRateHistory,
}

impl FundingRow {
    fn from_samples(
        current: &FundingRateSample,
        history: FundingRateHistory,
        periods_per_day: u32,
    ) -> Self {
        let avg_rate_7d = history.average_rate();

        Self {
            exchange: current.exchange.to_string(),
            symbol: current.symbol.clone(),
            funding_rate: Some(current.rate),
            apy: Some(calculate_apy(current.rate, periods_per_day)),
            avg_rate_7d,
            avg_apy_7d: avg_rate_7d.map(|r| calculate_apy(r, periods_per_day)),
            latest_rate: history.latest().map(|s| s.rate),
            samples: Some(history.len()),
            error: None,
            history,
        }
    }

    fn unavailable(market: &MarketId, error: String) -> Self {
        Self {
            exchange: market.exchange.clone(),
            symbol: market.symbol.clone(),
            funding_rate: None,
            apy: None,
            avg_rate_7d: None,
            avg_apy_7d: None,
            latest_rate: None,
            samples: None,
            error: Some(error),
            history: FundingRateHistory::default(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of one pass over every configured market.
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<FundingRow>,
}

impl Report {
    pub fn failures(&self) -> impl Iterator<Item = &FundingRow> {
        self.rows.iter().filter(|r| !r.is_ok())
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }
}

/// Walks the configured markets one at a time and turns their funding
/// data into report rows.
pub struct Reporter {
    exchanges: Vec<Box<dyn Exchange>>,
    markets: Vec<MarketId>,
    periods_per_day: u32,
    fetch_timeout: Duration,
}

impl Reporter {
    pub fn new(
        exchanges: Vec<Box<dyn Exchange>>,
        markets: Vec<MarketId>,
        periods_per_day: u32,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            exchanges,
            markets,
            periods_per_day,
            fetch_timeout,
        }
    }

    /// Builds one client per exchange named in the market list.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut exchanges: Vec<Box<dyn Exchange>> = Vec::new();

        for market in &config.markets {
            if exchanges.iter().any(|e| e.name() == market.exchange) {
                continue;
            }
            let exchange = exchanges::build(&market.exchange)
                .ok_or_else(|| ConfigError::UnknownExchange(market.exchange.clone()))?;
            exchanges.push(exchange);
        }

        Ok(Self::new(
            exchanges,
            config.markets.clone(),
            config.periods_per_day,
            config.fetch_timeout,
        ))
    }

    pub fn markets(&self) -> &[MarketId] {
        &self.markets
    }

    fn exchange(&self, name: &str) -> Option<&dyn Exchange> {
        self.exchanges
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
    }

    /// Fetches every market in order. A failing market never stops the
    /// pass: its row is filled with placeholders and the loop moves on.
    pub async fn collect(&self) -> Report {
        let mut rows = Vec::with_capacity(self.markets.len());

        for market in &self.markets {
            let result = match self.exchange(&market.exchange) {
                Some(exchange) => {
                    tokio::time::timeout(self.fetch_timeout, self.fetch_row(exchange, &market.symbol))
                        .await
                        .unwrap_or_else(|_| Err(ExchangeError::Timeout(self.fetch_timeout)))
                        .map_err(|e| e.to_string())
                }
                None => Err(format!("exchange {} is not configured", market.exchange)),
            };

            let row = match result {
                Ok(row) => {
                    metrics::counter!("fundscope_fetch_success_total", "exchange" => market.exchange.clone())
                        .increment(1);
                    tracing::info!(
                        "[{}] {} funding rate: {:.6} APY: {:.2}%",
                        row.exchange,
                        row.symbol,
                        row.funding_rate.unwrap_or_default(),
                        row.apy.unwrap_or_default()
                    );
                    row
                }
                Err(e) => {
                    metrics::counter!("fundscope_fetch_failures_total", "exchange" => market.exchange.clone())
                        .increment(1);
                    tracing::warn!("[{}] {} failed: {}", market.exchange, market.symbol, e);
                    FundingRow::unavailable(market, e)
                }
            };

            rows.push(row);
        }

        Report {
            generated_at: Utc::now(),
            rows,
        }
    }

    async fn fetch_row(
        &self,
        exchange: &dyn Exchange,
        symbol: &str,
    ) -> Result<FundingRow, ExchangeError> {
        let markets = exchange.load_markets().await?;
        let market = markets.get(symbol).ok_or_else(|| ExchangeError::UnknownMarket {
            exchange: exchange.name(),
            symbol: symbol.to_string(),
        })?;

        if !market.perpetual || !market.active {
            tracing::warn!(
                "[{}] {} ({}/{}) perpetual={} active={}",
                exchange.name(),
                market.symbol,
                market.base,
                market.quote,
                market.perpetual,
                market.active
            );
        }

        let current = exchange.fetch_funding_rate(symbol).await?;
        let since = FundingRateHistory::lookback_start(Utc::now());
        let history = exchange.fetch_funding_rate_history(symbol, since).await?;

        Ok(FundingRow::from_samples(&current, history, self.periods_per_day))
    }
}
