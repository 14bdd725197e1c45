use super::{get_json, parse_rate, timestamp_ms, Exchange};
use crate::errors::ExchangeError;
use crate::models::{FundingRateHistory, FundingRateSample, Market};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

const BASE_URL: &str = "https://api.bybit.com";
const INSTRUMENTS_PAGE_LIMIT: u32 = 1000;
const HISTORY_LIMIT: u32 = 200;

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Default + Deserialize<'de>"))]
struct BybitResponse<T> {
    #[serde(rename = "retCode")]
    ret_code: i32,

    #[serde(rename = "retMsg", default)]
    ret_msg: String,

    // error responses carry an empty object here
    #[serde(default)]
    result: T,

    #[serde(default)]
    time: i64,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ListResult<T> {
    #[serde(default)]
    list: Vec<T>,

    #[serde(rename = "nextPageCursor", default)]
    next_page_cursor: String,
}

// derive(Default) would demand T: Default
impl<T> Default for ListResult<T> {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            next_page_cursor: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BybitInstrument {
    symbol: String,

    #[serde(rename = "contractType")]
    contract_type: String,

    status: String,

    #[serde(rename = "baseCoin")]
    base_coin: String,

    #[serde(rename = "quoteCoin")]
    quote_coin: String,
}

#[derive(Debug, Deserialize)]
struct BybitTicker {
    symbol: String,

    #[serde(rename = "fundingRate")]
    funding_rate: String,
}

#[derive(Debug, Deserialize)]
struct BybitFundingEntry {
    symbol: String,

    #[serde(rename = "fundingRate")]
    funding_rate: String,

    #[serde(rename = "fundingRateTimestamp")]
    funding_rate_timestamp: String,
}

pub struct Bybit {
    client: reqwest::Client,
}

impl Bybit {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn get<T>(&self, url: &str) -> Result<BybitResponse<T>, ExchangeError>
    where
        T: Default + serde::de::DeserializeOwned,
    {
        let response: BybitResponse<T> = get_json(&self.client, url).await?;
        check(response)
    }
}

/// Bybit signals errors via retCode, not just HTTP status
fn check<T>(response: BybitResponse<T>) -> Result<BybitResponse<T>, ExchangeError> {
    if response.ret_code != 0 {
        return Err(ExchangeError::UnexpectedData(format!(
            "Bybit retCode {}: {}",
            response.ret_code, response.ret_msg
        )));
    }
    Ok(response)
}

fn to_market(instrument: BybitInstrument) -> Market {
    Market {
        perpetual: instrument.contract_type.ends_with("Perpetual"),
        active: instrument.status == "Trading",
        symbol: instrument.symbol,
        base: instrument.base_coin,
        quote: instrument.quote_coin,
    }
}

#[async_trait]
impl Exchange for Bybit {
    fn name(&self) -> &'static str {
        "bybit"
    }

    async fn load_markets(&self) -> Result<BTreeMap<String, Market>, ExchangeError> {
        let mut markets = BTreeMap::new();
        let mut cursor = String::new();

        loop {
            let mut url = format!(
                "{}/v5/market/instruments-info?category=linear&limit={}",
                BASE_URL, INSTRUMENTS_PAGE_LIMIT
            );
            if !cursor.is_empty() {
                url.push_str("&cursor=");
                url.push_str(&cursor);
            }

            let page = self.get::<ListResult<BybitInstrument>>(&url).await?.result;
            for instrument in page.list {
                markets.insert(instrument.symbol.clone(), to_market(instrument));
            }

            if page.next_page_cursor.is_empty() {
                break;
            }
            cursor = page.next_page_cursor;
        }

        Ok(markets)
    }

    async fn fetch_funding_rate(&self, symbol: &str) -> Result<FundingRateSample, ExchangeError> {
        let url = format!(
            "{}/v5/market/tickers?category=linear&symbol={}",
            BASE_URL, symbol
        );
        let response = self.get::<ListResult<BybitTicker>>(&url).await?;

        // list always has one item when querying by symbol
        let ticker = response.result.list.into_iter().next().ok_or_else(|| {
            ExchangeError::UnexpectedData(format!("Bybit returned empty list for {}", symbol))
        })?;

        Ok(FundingRateSample {
            exchange: self.name(),
            rate: parse_rate(&ticker.funding_rate)?,
            timestamp: timestamp_ms(response.time)?,
            symbol: ticker.symbol,
        })
    }

    async fn fetch_funding_rate_history(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<FundingRateHistory, ExchangeError> {
        // startTime alone is rejected, the window needs both ends
        let url = format!(
            "{}/v5/market/funding/history?category=linear&symbol={}&startTime={}&endTime={}&limit={}",
            BASE_URL,
            symbol,
            since.timestamp_millis(),
            Utc::now().timestamp_millis(),
            HISTORY_LIMIT
        );
        let response = self.get::<ListResult<BybitFundingEntry>>(&url).await?;

        to_history(self.name(), response.result)
    }
}

fn to_history(
    exchange: &'static str,
    page: ListResult<BybitFundingEntry>,
) -> Result<FundingRateHistory, ExchangeError> {
    let mut samples = page
        .list
        .into_iter()
        .map(|entry| to_sample(exchange, entry))
        .collect::<Result<Vec<_>, ExchangeError>>()?;

    // Bybit returns newest first
    samples.sort_by_key(|s| s.timestamp);
    Ok(FundingRateHistory::new(samples))
}

fn to_sample(
    exchange: &'static str,
    entry: BybitFundingEntry,
) -> Result<FundingRateSample, ExchangeError> {
    let ms = entry
        .funding_rate_timestamp
        .parse::<i64>()
        .map_err(|e| ExchangeError::UnexpectedData(e.to_string()))?;

    Ok(FundingRateSample {
        exchange,
        rate: parse_rate(&entry.funding_rate)?,
        timestamp: timestamp_ms(ms)?,
        symbol: entry.symbol,
    })
}
