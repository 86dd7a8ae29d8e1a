use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::broker::types::Side;
use crate::config::AppConfig;
use crate::signal::{Alert, CanonicalAction};

/// Flat record posted to the spreadsheet webhook, one per processed alert.
#[derive(Clone, Debug, Serialize)]
pub struct SheetRow {
    pub ticker: String,
    pub timeframe: String,
    pub strategy: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub side: String,
    pub price: String,
}

impl SheetRow {
    pub fn from_alert(alert: &Alert, action: CanonicalAction) -> Self {
        let side = match action {
            CanonicalAction::LongEntry => Side::Buy.as_str(),
            CanonicalAction::ShortEntry => Side::Sell.as_str(),
            _ => "close",
        };

        Self {
            ticker: alert.symbol.clone().unwrap_or_default(),
            timeframe: alert.timeframe.clone().unwrap_or_default(),
            strategy: alert.strategy.clone().unwrap_or_default(),
            kind: action.as_str().to_string(),
            side: side.to_string(),
            price: alert.price.map(|p| p.to_string()).unwrap_or_default(),
        }
    }
}

/// Best-effort audit channel. Implementations must swallow their own
/// failures: recording never aborts or alters a trading decision.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn record(&self, row: SheetRow);
}

/// Posts each row to an external spreadsheet webhook. The response is
/// ignored beyond logging.
pub struct SheetSink {
    client: Client,
    url: String,
}

impl SheetSink {
    pub fn new(config: &AppConfig, url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, url }
    }
}

#[async_trait]
impl AlertSink for SheetSink {
    async fn record(&self, row: SheetRow) {
        match self.client.post(&self.url).json(&row).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(ticker = %row.ticker, "sheet row recorded");
            }
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "sheet webhook rejected row");
            }
            Err(e) => {
                warn!(error = %e, "sheet webhook unreachable");
            }
        }
    }
}

/// Used when no sheet webhook is configured.
pub struct NullSink;

#[async_trait]
impl AlertSink for NullSink {
    async fn record(&self, row: SheetRow) {
        debug!(ticker = %row.ticker, kind = %row.kind, "sink disabled, dropping row");
    }
}
