use crate::apy::DEFAULT_PERIODS_PER_DAY;
use crate::errors::ConfigError;
use crate::exchanges;
use crate::models::MarketId;
use std::env;
use std::time::Duration;

const DEFAULT_MARKETS: &str = "binance:ETHUSDT,bybit:ETHUSDT,kraken:PF_ETHUSD";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub markets: Vec<MarketId>,
    pub periods_per_day: u32,
    pub fetch_timeout: Duration,
    pub api_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // the default list is known to parse
            markets: Self::parse_markets(DEFAULT_MARKETS).unwrap_or_default(),
            periods_per_day: DEFAULT_PERIODS_PER_DAY,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            api_port: DEFAULT_API_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let markets = Self::parse_markets(
            &env::var("MARKETS").unwrap_or_else(|_| DEFAULT_MARKETS.to_string()),
        )?;

        let periods_per_day = nonzero(
            "FUNDING_PERIODS_PER_DAY",
            parse_var("FUNDING_PERIODS_PER_DAY", DEFAULT_PERIODS_PER_DAY)?,
        )?;

        let fetch_timeout = Duration::from_secs(nonzero(
            "FETCH_TIMEOUT_SECS",
            parse_var("FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?,
        )?);
        let api_port = parse_var("API_PORT", DEFAULT_API_PORT)?;

        Ok(Self {
            markets,
            periods_per_day,
            fetch_timeout,
            api_port,
        })
    }

    /// Parses a comma separated list of `exchange:SYMBOL` entries.
    /// Exchange names are lowercased, symbols uppercased.
    pub fn parse_markets(raw: &str) -> Result<Vec<MarketId>, ConfigError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|entry| {
                let (exchange, symbol) = entry
                    .split_once(':')
                    .map(|(e, s)| (e.trim().to_lowercase(), s.trim().to_uppercase()))
                    .filter(|(e, s)| !e.is_empty() && !s.is_empty())
                    .ok_or_else(|| ConfigError::InvalidMarket(entry.to_string()))?;

                if !exchanges::SUPPORTED.contains(&exchange.as_str()) {
                    return Err(ConfigError::UnknownExchange(exchange));
                }

                Ok(MarketId::new(exchange, symbol))
            })
            .collect()
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}

fn nonzero<T>(key: &'static str, value: T) -> Result<T, ConfigError>
where
    T: Default + PartialEq + ToString,
{
    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}
