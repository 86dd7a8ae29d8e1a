use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::BrokerError;

use super::traits::{BrokerApi, BrokerResult};
use super::types::{
    AccountSnapshot, AssetSnapshot, MarketClock, OrderAck, OrderRequest, OrderType, Position,
    PositionSide, TimeInForce,
};

/// Thin reqwest client over the Alpaca trading REST API. All calls share
/// one bounded-timeout HTTP client; a timed-out call aborts the request
/// it belongs to.
#[derive(Clone)]
pub struct AlpacaClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
}

impl AlpacaClient {
    pub fn new(config: &AppConfig) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.alpaca_base_url.trim_end_matches('/').to_string(),
            api_key: config.alpaca_api_key.clone(),
            secret_key: config.alpaca_secret_key.clone(),
        })
    }

    fn auth(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
    }

    /// Send a request and decode a 2xx body as T. Non-2xx keeps the raw
    /// body verbatim in the error.
    async fn send<T: for<'de> Deserialize<'de>>(&self, req: RequestBuilder) -> BrokerResult<T> {
        let resp = self.auth(req).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(BrokerError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Alpaca encodes decimals as strings on the wire. A field that fails to
/// parse is a broken payload and must surface as an error, not silently
/// become zero and turn the request into a bogus no-op.
pub(crate) fn parse_decimal(field: &'static str, raw: &str) -> BrokerResult<f64> {
    raw.parse().map_err(|_| {
        BrokerError::Deserialization(serde::de::Error::custom(format!(
            "{field} is not a number: {raw:?}"
        )))
    })
}

// Raw wire shapes before conversion to the typed snapshots.

#[derive(Deserialize)]
struct AccountWire {
    status: String,
    #[serde(default)]
    trading_blocked: bool,
    #[serde(default)]
    account_blocked: bool,
    buying_power: String,
}

#[derive(Deserialize)]
struct PositionWire {
    symbol: String,
    side: String,
    qty: String,
}

#[derive(Serialize)]
struct OrderWire {
    symbol: String,
    qty: String,
    side: &'static str,
    #[serde(rename = "type")]
    type_: &'static str,
    time_in_force: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit_price: Option<String>,
    extended_hours: bool,
    client_order_id: String,
}

impl From<&OrderRequest> for OrderWire {
    fn from(order: &OrderRequest) -> Self {
        Self {
            symbol: order.symbol.clone(),
            qty: order.qty.to_string(),
            side: order.side.as_str(),
            type_: match order.order_type {
                OrderType::Market => "market",
                OrderType::Limit => "limit",
            },
            time_in_force: match order.time_in_force {
                TimeInForce::Day => "day",
            },
            limit_price: order.limit_price.map(|p| p.to_string()),
            extended_hours: order.extended_hours,
            client_order_id: order.client_order_id.clone(),
        }
    }
}

#[async_trait]
impl BrokerApi for AlpacaClient {
    async fn get_account(&self) -> BrokerResult<AccountSnapshot> {
        let url = format!("{}/v2/account", self.base_url);
        let wire: AccountWire = self.send(self.client.get(&url)).await?;
        Ok(AccountSnapshot {
            status: wire.status,
            trading_blocked: wire.trading_blocked,
            account_blocked: wire.account_blocked,
            buying_power: parse_decimal("buying_power", &wire.buying_power)?,
        })
    }

    async fn get_asset(&self, symbol: &str) -> BrokerResult<AssetSnapshot> {
        let url = format!("{}/v2/assets/{}", self.base_url, symbol);
        self.send(self.client.get(&url)).await
    }

    async fn get_clock(&self) -> BrokerResult<MarketClock> {
        let url = format!("{}/v2/clock", self.base_url);
        self.send(self.client.get(&url)).await
    }

    async fn get_position(&self, symbol: &str) -> BrokerResult<Option<Position>> {
        let url = format!("{}/v2/positions/{}", self.base_url, symbol);
        match self.send::<PositionWire>(self.client.get(&url)).await {
            Ok(wire) => {
                let side = if wire.side.eq_ignore_ascii_case("short") {
                    PositionSide::Short
                } else {
                    PositionSide::Long
                };
                // Alpaca reports short quantities as negative.
                let qty = parse_decimal("qty", &wire.qty)?.abs();
                Ok(Some(Position {
                    symbol: wire.symbol,
                    side,
                    qty,
                }))
            }
            Err(BrokerError::Http { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn submit_order(&self, order: &OrderRequest) -> BrokerResult<OrderAck> {
        let url = format!("{}/v2/orders", self.base_url);
        let wire = OrderWire::from(order);
        let raw: Value = self.send(self.client.post(&url).json(&wire)).await?;

        let id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let status = raw
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(OrderAck { id, status, raw })
    }
}
