use std::collections::HashMap;
use std::env;

use crate::error::RelayError;

const DEFAULT_BASE_URL: &str = "https://paper-api.alpaca.markets";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_RISK_PCT: f64 = 0.01;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 12;

/// Immutable runtime configuration, read once at startup and passed into
/// the broker client, sink, and decision engine. Never ambient state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub alpaca_api_key: String,
    pub alpaca_secret_key: String,
    pub alpaca_base_url: String,

    /// Fraction of live buying power committed per entry signal, in (0, 1].
    pub risk_pct: f64,

    /// Optional best-effort audit sink. None disables the sink entirely.
    pub sheet_webhook_url: Option<String>,

    pub bind_addr: String,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, RelayError> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Env-shaped construction with an injectable lookup so tests do not
    /// have to mutate process-global environment variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let alpaca_api_key = lookup("ALPACA_API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RelayError::Config("ALPACA_API_KEY not set".to_string()))?;
        let alpaca_secret_key = lookup("ALPACA_SECRET_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RelayError::Config("ALPACA_SECRET_KEY not set".to_string()))?;

        let alpaca_base_url =
            lookup("ALPACA_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let risk_pct = match lookup("RISK_PCT") {
            Some(raw) => raw
                .parse::<f64>()
                .map_err(|_| RelayError::Config(format!("RISK_PCT is not a number: {raw:?}")))?,
            None => DEFAULT_RISK_PCT,
        };
        if !(risk_pct > 0.0 && risk_pct <= 1.0) {
            return Err(RelayError::Config(format!(
                "RISK_PCT must be in (0, 1], got {risk_pct}"
            )));
        }

        let http_timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                RelayError::Config(format!("HTTP_TIMEOUT_SECS is not an integer: {raw:?}"))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            alpaca_api_key,
            alpaca_secret_key,
            alpaca_base_url,
            risk_pct,
            sheet_webhook_url: lookup("SHEET_WEBHOOK_URL").filter(|v| !v.is_empty()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            http_timeout_secs,
        })
    }
}
