use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::engine::{DecisionEngine, Outcome};
use crate::error::RelayError;
use crate::signal::Alert;
use crate::sink::{AlertSink, SheetRow};

pub struct AppState {
    pub engine: DecisionEngine,
    pub sink: Arc<dyn AlertSink>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn run_server(state: Arc<AppState>, bind_addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("webhook server listening on {bind_addr}");
    axum::serve(listener, router(state)).await
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Response envelope for the webhook caller: 200 with status "ok" for
/// successes and no-ops, 400 with status "error" for every validation or
/// brokerage failure.
#[derive(Serialize)]
struct WebhookReply {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alpaca: Option<Value>,
}

async fn webhook(State(state): State<Arc<AppState>>, Json(raw): Json<Value>) -> Response {
    info!(payload = %raw, "received alert");

    let alert: Alert = match serde_json::from_value(raw) {
        Ok(alert) => alert,
        Err(e) => return error_response(RelayError::Malformed(e.to_string())),
    };

    // Required-input validation happens before anything else runs.
    let action = match alert.ticker().and_then(|_| alert.action()) {
        Ok(action) => action,
        Err(e) => return error_response(e),
    };

    // Fire-and-forget audit record. Runs detached so a slow or dead sink
    // never delays or derails the trading decision.
    let sink = state.sink.clone();
    let row = SheetRow::from_alert(&alert, action);
    tokio::spawn(async move { sink.record(row).await });

    match state.engine.handle(action, &alert).await {
        Ok(Outcome::Submitted { action, ack }) => {
            info!(action = action.as_str(), order_id = %ack.id, "order submitted");
            Json(WebhookReply {
                status: "ok",
                action: Some(action.as_str()),
                message: None,
                alpaca: Some(ack.raw),
            })
            .into_response()
        }
        Ok(Outcome::NoOp { action, reason }) => {
            info!(action = action.as_str(), reason = %reason, "no-op");
            Json(WebhookReply {
                status: "ok",
                action: Some(action.as_str()),
                message: Some(reason),
                alpaca: None,
            })
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

fn error_response(err: RelayError) -> Response {
    warn!(error = %err, "alert rejected");

    // When the broker returned a JSON body, pass it through verbatim.
    let alpaca = match &err {
        RelayError::Broker(broker) => broker
            .upstream_body()
            .and_then(|body| serde_json::from_str::<Value>(body).ok()),
        _ => None,
    };

    (
        StatusCode::BAD_REQUEST,
        Json(WebhookReply {
            status: "error",
            action: None,
            message: Some(err.to_string()),
            alpaca,
        }),
    )
        .into_response()
}
