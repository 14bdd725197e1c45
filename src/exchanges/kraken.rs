use super::{get_json, Exchange};
use crate::errors::ExchangeError;
use crate::models::{FundingRateHistory, FundingRateSample, Market};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

const BASE_URL: &str = "https://futures.kraken.com/derivatives/api";

/// Kraken settles funding hourly. Rates are scaled to the 8-hour period
/// the other venues pay on, so one periods-per-day setting fits all.
const HOURLY_TO_8H: f64 = 8.0;

#[derive(Debug, Deserialize)]
struct InstrumentsResponse {
    result: String,

    #[serde(default)]
    error: Option<String>,

    #[serde(default)]
    instruments: Vec<KrakenInstrument>,
}

#[derive(Debug, Deserialize)]
struct KrakenInstrument {
    symbol: String,

    #[serde(default)]
    base: Option<String>,

    #[serde(default)]
    quote: Option<String>,

    #[serde(default)]
    tradeable: bool,

    // only dated futures expire
    #[serde(rename = "lastTradingTime", default)]
    last_trading_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TickersResponse {
    result: String,

    #[serde(default)]
    error: Option<String>,

    #[serde(default)]
    tickers: Vec<KrakenTicker>,

    #[serde(rename = "serverTime")]
    server_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct KrakenTicker {
    symbol: String,

    /// Absolute funding per contract, not a fraction.
    #[serde(rename = "fundingRate")]
    funding_rate: Option<f64>,

    #[serde(rename = "markPrice")]
    mark_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HistoricalRatesResponse {
    #[serde(default)]
    result: Option<String>,

    #[serde(default)]
    error: Option<String>,

    #[serde(default)]
    rates: Vec<HistoricalRate>,
}

#[derive(Debug, Deserialize)]
struct HistoricalRate {
    timestamp: DateTime<Utc>,

    #[serde(rename = "relativeFundingRate")]
    relative_funding_rate: f64,
}

/// Kraken Futures (formerly Crypto Facilities) public API.
pub struct Kraken {
    client: reqwest::Client,
}

impl Kraken {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

fn check(result: &str, error: Option<&str>) -> Result<(), ExchangeError> {
    if result == "success" {
        return Ok(());
    }
    Err(ExchangeError::UnexpectedData(format!(
        "Kraken result '{}': {}",
        result,
        error.unwrap_or("no error message")
    )))
}

fn to_market(instrument: KrakenInstrument) -> Market {
    let symbol = instrument.symbol.to_uppercase();
    Market {
        perpetual: instrument.last_trading_time.is_none(),
        active: instrument.tradeable,
        base: instrument.base.unwrap_or_default(),
        quote: instrument.quote.unwrap_or_default(),
        symbol,
    }
}

/// Kraken quotes hourly funding per contract; dividing by the mark price
/// gives the fraction of notional, then it is scaled to 8 hours.
fn relative_rate(ticker: &KrakenTicker) -> Result<f64, ExchangeError> {
    match (ticker.funding_rate, ticker.mark_price) {
        (Some(rate), Some(mark)) if mark != 0.0 => Ok(rate / mark * HOURLY_TO_8H),
        _ => Err(ExchangeError::UnexpectedData(format!(
            "no funding rate for {}",
            ticker.symbol
        ))),
    }
}

#[async_trait]
impl Exchange for Kraken {
    fn name(&self) -> &'static str {
        "kraken"
    }

    async fn load_markets(&self) -> Result<BTreeMap<String, Market>, ExchangeError> {
        let url = format!("{BASE_URL}/v3/instruments");
        let response: InstrumentsResponse = get_json(&self.client, &url).await?;
        check(&response.result, response.error.as_deref())?;

        Ok(response
            .instruments
            .into_iter()
            .map(to_market)
            .map(|market| (market.symbol.clone(), market))
            .collect())
    }

    async fn fetch_funding_rate(&self, symbol: &str) -> Result<FundingRateSample, ExchangeError> {
        let url = format!("{BASE_URL}/v3/tickers");
        let response: TickersResponse = get_json(&self.client, &url).await?;
        check(&response.result, response.error.as_deref())?;

        let ticker = response
            .tickers
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| {
                ExchangeError::UnexpectedData(format!("Kraken returned no ticker for {symbol}"))
            })?;

        Ok(FundingRateSample {
            exchange: self.name(),
            symbol: ticker.symbol.to_uppercase(),
            rate: relative_rate(ticker)?,
            timestamp: response.server_time.unwrap_or_else(Utc::now),
        })
    }

    async fn fetch_funding_rate_history(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<FundingRateHistory, ExchangeError> {
        // the endpoint has no time filter and returns the full history
        let url = format!("{BASE_URL}/v4/historicalfundingrates?symbol={symbol}");
        let response: HistoricalRatesResponse = get_json(&self.client, &url).await?;

        to_history(self.name(), symbol, response, since)
    }
}

fn to_history(
    exchange: &'static str,
    symbol: &str,
    response: HistoricalRatesResponse,
    since: DateTime<Utc>,
) -> Result<FundingRateHistory, ExchangeError> {
    // v4 omits `result` on success but may still send an error envelope
    match (response.result.as_deref(), response.error.as_deref()) {
        (Some(result), error) => check(result, error)?,
        (None, Some(error)) => check("error", Some(error))?,
        (None, None) => {}
    }

    let mut samples: Vec<FundingRateSample> = response
        .rates
        .into_iter()
        .filter(|r| r.timestamp >= since)
        .map(|r| FundingRateSample {
            exchange,
            symbol: symbol.to_uppercase(),
            rate: r.relative_funding_rate * HOURLY_TO_8H,
            timestamp: r.timestamp,
        })
        .collect();
    samples.sort_by_key(|s| s.timestamp);
    Ok(FundingRateHistory::new(samples))
}
