//! signal-relay - TradingView webhook to Alpaca order relay
//!
//! Receives trading-signal webhooks, normalizes the free-form signal
//! vocabulary, and places risk-sized, idempotent orders (or position
//! closes) against the Alpaca trading API, with a best-effort spreadsheet
//! audit record per alert.

pub mod api;
pub mod broker;
pub mod config;
pub mod engine;
pub mod error;
pub mod signal;
pub mod sink;

// Re-export commonly used types
pub use config::AppConfig;
pub use engine::{DecisionEngine, Outcome};
pub use error::{BrokerError, RelayError};
pub use signal::{normalize, Alert, CanonicalAction};

#[cfg(test)]
mod api_tests;
