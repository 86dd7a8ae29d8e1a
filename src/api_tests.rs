//! Handler-level tests for the webhook surface: status codes and the
//! response envelope, driven through the router with a scripted broker.

#[cfg(test)]
mod api_tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::api::{router, AppState};
    use crate::broker::traits::{BrokerApi, BrokerResult};
    use crate::broker::types::{
        AccountSnapshot, AssetSnapshot, MarketClock, OrderAck, OrderRequest, Position,
        PositionSide,
    };
    use crate::engine::DecisionEngine;
    use crate::error::BrokerError;
    use crate::sink::NullSink;

    struct ScriptedBroker {
        account: AccountSnapshot,
        asset: AssetSnapshot,
        clock: MarketClock,
        position: Option<Position>,
        submitted: Mutex<Vec<OrderRequest>>,
        reject_orders: bool,
    }

    impl ScriptedBroker {
        fn healthy() -> Self {
            Self {
                account: AccountSnapshot {
                    status: "ACTIVE".to_string(),
                    trading_blocked: false,
                    account_blocked: false,
                    buying_power: 10_000.0,
                },
                asset: AssetSnapshot {
                    tradable: true,
                    shortable: true,
                },
                clock: MarketClock { is_open: true },
                position: None,
                submitted: Mutex::new(Vec::new()),
                reject_orders: false,
            }
        }
    }

    #[async_trait]
    impl BrokerApi for ScriptedBroker {
        async fn get_account(&self) -> BrokerResult<AccountSnapshot> {
            Ok(self.account.clone())
        }

        async fn get_asset(&self, _symbol: &str) -> BrokerResult<AssetSnapshot> {
            Ok(self.asset.clone())
        }

        async fn get_clock(&self) -> BrokerResult<MarketClock> {
            Ok(self.clock.clone())
        }

        async fn get_position(&self, _symbol: &str) -> BrokerResult<Option<Position>> {
            Ok(self.position.clone())
        }

        async fn submit_order(&self, order: &OrderRequest) -> BrokerResult<OrderAck> {
            if self.reject_orders {
                return Err(BrokerError::Http {
                    status: 403,
                    body: r#"{"code":40310000,"message":"insufficient buying power"}"#.to_string(),
                });
            }
            self.submitted.lock().unwrap().push(order.clone());
            Ok(OrderAck {
                id: "order-1".to_string(),
                status: "accepted".to_string(),
                raw: json!({"id": "order-1", "status": "accepted"}),
            })
        }
    }

    fn app(broker: ScriptedBroker) -> Router {
        let engine = DecisionEngine::new(Arc::new(broker), 0.01);
        router(Arc::new(AppState {
            engine,
            sink: Arc::new(NullSink),
        }))
    }

    async fn post_webhook(app: Router, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_entry_returns_200_ok_with_broker_ack() {
        let payload = json!({
            "ticker": "AAPL",
            "alert": "long",
            "price": "150.00",
            "signal_id": "s1"
        });
        let (status, body) = post_webhook(app(ScriptedBroker::healthy()), &payload.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["action"], "long_entry");
        assert_eq!(body["alpaca"]["status"], "accepted");
    }

    #[tokio::test]
    async fn test_exit_without_position_returns_200_noop() {
        let payload = json!({"ticker": "AAPL", "alert": "exit"});
        let (status, body) = post_webhook(app(ScriptedBroker::healthy()), &payload.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["action"], "exit");
        assert!(body["message"].as_str().unwrap().contains("no open position"));
        assert!(body.get("alpaca").is_none());
    }

    #[tokio::test]
    async fn test_exit_with_position_returns_200_ok() {
        let mut broker = ScriptedBroker::healthy();
        broker.position = Some(Position {
            symbol: "AAPL".to_string(),
            side: PositionSide::Long,
            qty: 2.0,
        });
        let payload = json!({"ticker": "AAPL", "alert": "close_long"});
        let (status, body) = post_webhook(app(broker), &payload.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["action"], "exit_long");
    }

    #[tokio::test]
    async fn test_unknown_signal_returns_400_error_envelope() {
        let payload = json!({"ticker": "AAPL", "alert": "hodl"});
        let (status, body) = post_webhook(app(ScriptedBroker::healthy()), &payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("hodl"));
    }

    #[tokio::test]
    async fn test_missing_ticker_returns_400() {
        let payload = json!({"alert": "long", "price": 150.0});
        let (status, body) = post_webhook(app(ScriptedBroker::healthy()), &payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("ticker"));
    }

    #[tokio::test]
    async fn test_non_shortable_rejection_returns_400() {
        let mut broker = ScriptedBroker::healthy();
        broker.asset.shortable = false;
        let payload = json!({"ticker": "XYZ", "alert": "short", "price": 10.0});
        let (status, body) = post_webhook(app(broker), &payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("not shortable"));
    }

    #[tokio::test]
    async fn test_broker_rejection_passes_upstream_body_through() {
        let mut broker = ScriptedBroker::healthy();
        broker.reject_orders = true;
        let payload = json!({
            "ticker": "AAPL",
            "alert": "long",
            "price": 150.0,
            "signal_id": "s9"
        });
        let (status, body) = post_webhook(app(broker), &payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        // The broker's own JSON diagnostic rides along verbatim.
        assert_eq!(body["alpaca"]["code"], 40310000);
        assert_eq!(body["alpaca"]["message"], "insufficient buying power");
    }

    #[tokio::test]
    async fn test_syntactically_invalid_body_returns_400() {
        let (status, _body) = post_webhook(app(ScriptedBroker::healthy()), "not json {").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_returns_200() {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app(ScriptedBroker::healthy()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
