use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Live account state, fetched fresh for every entry request. Never cached:
/// buying power changes after every fill.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Alpaca account status string, e.g. "ACTIVE".
    pub status: String,
    pub trading_blocked: bool,
    pub account_blocked: bool,
    pub buying_power: f64,
}

impl AccountSnapshot {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub tradable: bool,
    pub shortable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketClock {
    pub is_open: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

/// An open position for one symbol. Quantity is always positive; the side
/// carries the direction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub qty: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

/// Every order this relay places is day-scoped; extended-hours limit
/// entries expire with the session rather than resting indefinitely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Day,
}

/// One fully-shaped order, built once per decision and submitted exactly
/// once. `client_order_id` is the sole idempotence guarantee: webhook
/// senders retry on timeout, and Alpaca deduplicates on this key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    /// Fractional quantities are supported.
    pub qty: f64,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub limit_price: Option<f64>,
    pub extended_hours: bool,
    /// Deterministic per (symbol, action, signal_id); at most 48 chars.
    pub client_order_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderAck {
    pub id: String,
    pub status: String,
    pub raw: Value,
}
