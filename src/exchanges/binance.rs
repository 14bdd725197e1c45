use super::{get_json, parse_rate, timestamp_ms, Exchange};
use crate::errors::ExchangeError;
use crate::models::{FundingRateHistory, FundingRateSample, Market};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

const BASE_URL: &str = "https://fapi.binance.com";

/// Binance caps /fundingRate at 1000 rows, far more than 7 days of 8h funding.
const HISTORY_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
struct ExchangeInfoResponse {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct SymbolInfo {
    symbol: String,

    #[serde(rename = "baseAsset")]
    base_asset: String,

    #[serde(rename = "quoteAsset")]
    quote_asset: String,

    #[serde(rename = "contractType")]
    contract_type: String,

    status: String,
}

/// The raw JSON shape Binance sends back
#[derive(Debug, Deserialize)]
struct PremiumIndexResponse {
    symbol: String,

    #[serde(rename = "lastFundingRate")]
    last_funding_rate: String,

    time: i64,
}

#[derive(Debug, Deserialize)]
struct FundingRateEntry {
    symbol: String,

    #[serde(rename = "fundingRate")]
    funding_rate: String,

    #[serde(rename = "fundingTime")]
    funding_time: i64,
}

pub struct Binance {
    client: reqwest::Client,
}

impl Binance {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

fn to_market(info: SymbolInfo) -> Market {
    Market {
        perpetual: info.contract_type == "PERPETUAL",
        active: info.status == "TRADING",
        symbol: info.symbol,
        base: info.base_asset,
        quote: info.quote_asset,
    }
}

#[async_trait]
impl Exchange for Binance {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn load_markets(&self) -> Result<BTreeMap<String, Market>, ExchangeError> {
        let url = format!("{}/fapi/v1/exchangeInfo", BASE_URL);
        let response: ExchangeInfoResponse = get_json(&self.client, &url).await?;

        Ok(response
            .symbols
            .into_iter()
            .map(|info| (info.symbol.clone(), to_market(info)))
            .collect())
    }

    /// Hits Binance's premiumIndex endpoint and maps the response
    /// into the normalized sample.
    async fn fetch_funding_rate(&self, symbol: &str) -> Result<FundingRateSample, ExchangeError> {
        let url = format!("{}/fapi/v1/premiumIndex?symbol={}", BASE_URL, symbol);
        let response: PremiumIndexResponse = get_json(&self.client, &url).await?;

        Ok(FundingRateSample {
            exchange: self.name(),
            rate: parse_rate(&response.last_funding_rate)?,
            timestamp: timestamp_ms(response.time)?,
            symbol: response.symbol,
        })
    }

    async fn fetch_funding_rate_history(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<FundingRateHistory, ExchangeError> {
        let url = format!(
            "{}/fapi/v1/fundingRate?symbol={}&startTime={}&limit={}",
            BASE_URL,
            symbol,
            since.timestamp_millis(),
            HISTORY_LIMIT
        );
        let entries: Vec<FundingRateEntry> = get_json(&self.client, &url).await?;

        // already ascending by fundingTime
        entries
            .into_iter()
            .map(|entry| {
                Ok(FundingRateSample {
                    exchange: self.name(),
                    rate: parse_rate(&entry.funding_rate)?,
                    timestamp: timestamp_ms(entry.funding_time)?,
                    symbol: entry.symbol,
                })
            })
            .collect::<Result<Vec<_>, ExchangeError>>()
            .map(FundingRateHistory::new)
    }
}
