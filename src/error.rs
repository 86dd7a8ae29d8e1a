//! Custom error types for the relay
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use thiserror::Error;

/// Top-level relay errors. Everything here maps to an HTTP 400 at the
/// webhook boundary; the variants exist so each rejection is distinct
/// in logs and responses.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unrecognized signal: {0:?}")]
    UnknownSignal(String),

    #[error("invalid price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("account not eligible to trade: {reason}")]
    AccountBlocked { reason: String },

    #[error("asset {symbol} is not tradable")]
    NotTradable { symbol: String },

    #[error("asset {symbol} is not shortable")]
    NotShortable { symbol: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("broker API error: {0}")]
    Broker(#[from] BrokerError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Brokerage-specific errors. Non-2xx responses keep the upstream body
/// verbatim so the caller sees Alpaca's own diagnostic.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl BrokerError {
    /// The upstream response body, when this error carries one.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            BrokerError::Http { body, .. } => Some(body),
            _ => None,
        }
    }
}
