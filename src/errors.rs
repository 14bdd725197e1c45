use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected data from exchange: {0}")]
    UnexpectedData(String),

    #[error("Market {symbol} not found on {exchange}")]
    UnknownMarket {
        exchange: &'static str,
        symbol: String,
    },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid market '{0}', expected exchange:SYMBOL")]
    InvalidMarket(String),

    #[error("Unsupported exchange '{0}'")]
    UnknownExchange(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}
