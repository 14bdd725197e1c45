use crate::errors::ExchangeError;
use crate::models::{FundingRateHistory, FundingRateSample, Market};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

pub mod binance;
pub mod bybit;
pub mod kraken;

#[cfg(test)]
pub mod mock;

/// Exchange names accepted in the market list.
pub const SUPPORTED: [&str; 3] = ["binance", "bybit", "kraken"];

/// Read-only public market data needed to price funding.
#[async_trait]
pub trait Exchange: Send + Sync {
    fn name(&self) -> &'static str;

    /// All instruments listed on the exchange, keyed by native symbol.
    async fn load_markets(&self) -> Result<BTreeMap<String, Market>, ExchangeError>;

    async fn fetch_funding_rate(&self, symbol: &str) -> Result<FundingRateSample, ExchangeError>;

    /// Funding payments from `since` until now, oldest first.
    async fn fetch_funding_rate_history(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<FundingRateHistory, ExchangeError>;
}

/// Builds the adapter registered under `name`.
pub fn build(name: &str) -> Option<Box<dyn Exchange>> {
    match name {
        "binance" => Some(Box::new(binance::Binance::new())),
        "bybit" => Some(Box::new(bybit::Bybit::new())),
        "kraken" => Some(Box::new(kraken::Kraken::new())),
        _ => None,
    }
}

/// GETs `url` and decodes the JSON body, treating non-2xx statuses as errors.
async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, ExchangeError> {
    tracing::debug!("GET {url}");

    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(serde_json::from_str(&body)?)
}

fn parse_rate(raw: &str) -> Result<f64, ExchangeError> {
    raw.parse::<f64>()
        .map_err(|e| ExchangeError::UnexpectedData(format!("invalid funding rate '{raw}': {e}")))
}

fn timestamp_ms(ms: i64) -> Result<DateTime<Utc>, ExchangeError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| ExchangeError::UnexpectedData(format!("invalid timestamp {ms}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_supported_exchange() {
        for name in SUPPORTED {
            let exchange = build(name).unwrap();
            assert_eq!(exchange.name(), name);
        }
        assert!(build("ftx").is_none());
    }

    #[test]
    fn rates_parse_from_strings() {
        assert_eq!(parse_rate("0.00010000").unwrap(), 0.0001);
        assert_eq!(parse_rate("-0.0003").unwrap(), -0.0003);
        assert!(matches!(
            parse_rate("n/a"),
            Err(ExchangeError::UnexpectedData(_))
        ));
    }

    #[test]
    fn millisecond_timestamps() {
        let ts = timestamp_ms(1_704_067_200_000).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
