use super::Exchange;
use crate::errors::ExchangeError;
use crate::models::{FundingRateHistory, FundingRateSample, Market};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

/// In-memory exchange for driving the report without a network.
pub struct MockExchange {
    name: &'static str,
    markets: BTreeMap<String, Market>,
    current: HashMap<String, f64>,
    history: HashMap<String, Vec<f64>>,
    failing: HashSet<String>,
    delay: Option<std::time::Duration>,
}

impl MockExchange {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            markets: BTreeMap::new(),
            current: HashMap::new(),
            history: HashMap::new(),
            failing: HashSet::new(),
            delay: None,
        }
    }

    /// Lists `symbol` with a current rate and 8-hourly history rates.
    pub fn with_market(mut self, symbol: &str, rate: f64, history: &[f64]) -> Self {
        self.list(symbol);
        self.current.insert(symbol.to_string(), rate);
        self.history.insert(symbol.to_string(), history.to_vec());
        self
    }

    /// Lists `symbol` but fails every fetch for it.
    pub fn with_failing_market(mut self, symbol: &str) -> Self {
        self.list(symbol);
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn list(&mut self, symbol: &str) {
        self.markets.insert(
            symbol.to_string(),
            Market {
                symbol: symbol.to_string(),
                base: String::new(),
                quote: String::new(),
                perpetual: true,
                active: true,
            },
        );
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn fail_if_broken(&self, symbol: &str) -> Result<(), ExchangeError> {
        if self.failing.contains(symbol) {
            return Err(ExchangeError::UnexpectedData(format!(
                "{} rejected {}",
                self.name, symbol
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Exchange for MockExchange {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn load_markets(&self) -> Result<BTreeMap<String, Market>, ExchangeError> {
        self.pause().await;
        Ok(self.markets.clone())
    }

    async fn fetch_funding_rate(&self, symbol: &str) -> Result<FundingRateSample, ExchangeError> {
        self.fail_if_broken(symbol)?;
        let rate = self.current.get(symbol).copied().unwrap_or_default();
        Ok(FundingRateSample {
            exchange: self.name,
            symbol: symbol.to_string(),
            rate,
            timestamp: Self::start() + Duration::days(7),
        })
    }

    async fn fetch_funding_rate_history(
        &self,
        symbol: &str,
        _since: DateTime<Utc>,
    ) -> Result<FundingRateHistory, ExchangeError> {
        self.fail_if_broken(symbol)?;
        let rates = self.history.get(symbol).cloned().unwrap_or_default();
        Ok(rates
            .into_iter()
            .enumerate()
            .map(|(i, rate)| FundingRateSample {
                exchange: self.name,
                symbol: symbol.to_string(),
                rate,
                timestamp: Self::start() + Duration::hours(8 * i as i64),
            })
            .collect())
    }
}
