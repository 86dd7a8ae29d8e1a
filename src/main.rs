mod api;
mod broker;
mod config;
mod engine;
mod error;
mod signal;
mod sink;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{run_server, AppState};
use broker::alpaca::AlpacaClient;
use config::AppConfig;
use engine::DecisionEngine;
use sink::{AlertSink, NullSink, SheetSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("starting signal-relay...");

    let config = AppConfig::from_env()?;
    info!(
        base_url = %config.alpaca_base_url,
        risk_pct = config.risk_pct,
        sheet_sink = config.sheet_webhook_url.is_some(),
        "loaded configuration"
    );

    let broker = Arc::new(AlpacaClient::new(&config)?);
    let engine = DecisionEngine::new(broker, config.risk_pct);

    let sink: Arc<dyn AlertSink> = match &config.sheet_webhook_url {
        Some(url) => Arc::new(SheetSink::new(&config, url.clone())),
        None => Arc::new(NullSink),
    };

    let state = Arc::new(AppState { engine, sink });
    run_server(state, &config.bind_addr).await?;

    Ok(())
}
