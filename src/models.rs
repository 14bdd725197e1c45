use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Length of the funding history window shown next to the current rate.
pub const LOOKBACK_DAYS: i64 = 7;

/// One funding rate observation as reported by an exchange.
#[derive(Debug, Clone)]
pub struct FundingRateSample {
    pub exchange: &'static str,
    pub symbol: String,
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// Funding samples ordered by time, oldest first.
#[derive(Debug, Clone, Default)]
pub struct FundingRateHistory {
    samples: Vec<FundingRateSample>,
}

impl FundingRateHistory {
    pub fn new(samples: Vec<FundingRateSample>) -> Self {
        Self { samples }
    }

    /// Start of the lookback window ending at `now`.
    pub fn lookback_start(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(LOOKBACK_DAYS)
    }

    pub fn samples(&self) -> &[FundingRateSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean rate over the window, `None` when there is nothing to average.
    pub fn average_rate(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let total: f64 = self.samples.iter().map(|s| s.rate).sum();
        Some(total / self.samples.len() as f64)
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&FundingRateSample> {
        self.samples.last()
    }
}

impl FromIterator<FundingRateSample> for FundingRateHistory {
    fn from_iter<I: IntoIterator<Item = FundingRateSample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Listing metadata for a tradable instrument, keyed by its native symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub perpetual: bool,
    pub active: bool,
}

/// A configured market, written as `exchange:SYMBOL` (e.g. `binance:ETHUSDT`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketId {
    pub exchange: String,
    pub symbol: String,
}

impl MarketId {
    pub fn new(exchange: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(rate: f64, hour: u32) -> FundingRateSample {
        FundingRateSample {
            exchange: "test",
            symbol: "ETHUSDT".to_string(),
            rate,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_history_has_no_average() {
        let history = FundingRateHistory::default();
        assert_eq!(history.average_rate(), None);
        assert!(history.latest().is_none());
    }

    #[test]
    fn single_sample_is_latest() {
        let history = FundingRateHistory::new(vec![sample(0.0002, 0)]);
        assert_eq!(history.latest().map(|s| s.rate), Some(0.0002));
        assert_eq!(history.average_rate(), Some(0.0002));
    }

    #[test]
    fn average_and_latest_over_window() {
        let history: FundingRateHistory = [sample(0.0001, 0), sample(0.0003, 8), sample(-0.0001, 16)]
            .into_iter()
            .collect();
        let avg = history.average_rate().unwrap();
        assert!((avg - 0.0001).abs() < 1e-12);
        assert_eq!(history.latest().map(|s| s.rate), Some(-0.0001));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn lookback_is_seven_days() {
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        assert_eq!(
            FundingRateHistory::lookback_start(now),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn market_id_display() {
        assert_eq!(MarketId::new("bybit", "BTCUSDT").to_string(), "bybit:BTCUSDT");
    }
}
