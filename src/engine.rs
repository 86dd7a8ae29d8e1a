use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::broker::traits::BrokerApi;
use crate::broker::types::{
    OrderAck, OrderRequest, OrderType, Position, PositionSide, Side, TimeInForce,
};
use crate::error::RelayError;
use crate::signal::{Alert, CanonicalAction};

/// Idempotency keys must fit Alpaca's client_order_id limit.
pub const CLIENT_ORDER_ID_MAX: usize = 48;

/// What the engine decided for one alert. A NoOp is a successful outcome:
/// the signal was processed but no order was warranted.
#[derive(Debug)]
pub enum Outcome {
    Submitted {
        action: CanonicalAction,
        ack: OrderAck,
    },
    NoOp {
        action: CanonicalAction,
        reason: String,
    },
}

/// Per-request decision logic: pre-trade gate, risk sizing, order shaping,
/// and position-aware exits. Holds no cross-request state; "at most one
/// order per signal" rests entirely on broker-side client_order_id
/// deduplication.
#[derive(Clone)]
pub struct DecisionEngine {
    broker: Arc<dyn BrokerApi>,
    risk_pct: f64,
}

impl DecisionEngine {
    pub fn new(broker: Arc<dyn BrokerApi>, risk_pct: f64) -> Self {
        Self { broker, risk_pct }
    }

    pub async fn handle(
        &self,
        action: CanonicalAction,
        alert: &Alert,
    ) -> Result<Outcome, RelayError> {
        match action {
            CanonicalAction::LongEntry => self.enter(alert, action, Side::Buy).await,
            CanonicalAction::ShortEntry => self.enter(alert, action, Side::Sell).await,
            CanonicalAction::ExitLong | CanonicalAction::ExitShort | CanonicalAction::Exit => {
                self.close(alert, action).await
            }
            CanonicalAction::Unknown => Err(RelayError::UnknownSignal(
                alert.alert.clone().unwrap_or_default(),
            )),
        }
    }

    async fn enter(
        &self,
        alert: &Alert,
        action: CanonicalAction,
        side: Side,
    ) -> Result<Outcome, RelayError> {
        let symbol = alert.ticker()?;

        // Price is validated before any brokerage call is made.
        let price = alert.price.unwrap_or(0.0);
        if price <= 0.0 {
            return Err(RelayError::InvalidPrice {
                symbol: symbol.to_string(),
                price,
            });
        }

        let account = self.broker.get_account().await?;
        if !account.is_active() {
            return Err(RelayError::AccountBlocked {
                reason: format!("account status is {}", account.status),
            });
        }
        if account.trading_blocked {
            return Err(RelayError::AccountBlocked {
                reason: "trading_blocked is set".to_string(),
            });
        }
        if account.account_blocked {
            return Err(RelayError::AccountBlocked {
                reason: "account_blocked is set".to_string(),
            });
        }

        let asset = self.broker.get_asset(symbol).await?;
        if !asset.tradable {
            return Err(RelayError::NotTradable {
                symbol: symbol.to_string(),
            });
        }
        if side == Side::Sell && !asset.shortable {
            return Err(RelayError::NotShortable {
                symbol: symbol.to_string(),
            });
        }

        // Legacy fixed-qty override wins over risk sizing when present.
        let qty = match alert.qty {
            Some(hint) => hint as f64,
            None => risk_sized_qty(account.buying_power, self.risk_pct, price),
        };
        if qty <= 0.0 {
            info!(symbol, qty, "entry sized to zero, nothing to submit");
            return Ok(Outcome::NoOp {
                action,
                reason: format!("computed quantity {qty} is not positive"),
            });
        }

        let clock = self.broker.get_clock().await?;
        let order = shape_entry(symbol, qty, side, price, clock.is_open, action, alert);

        info!(
            symbol,
            side = side.as_str(),
            qty,
            client_order_id = %order.client_order_id,
            market_open = clock.is_open,
            "submitting entry order"
        );
        let ack = self.broker.submit_order(&order).await?;
        Ok(Outcome::Submitted { action, ack })
    }

    /// Close by submitting an explicit opposing market order for the full
    /// open quantity, so exits go through the same idempotency-key path
    /// as entries (not Alpaca's DELETE-position call).
    async fn close(&self, alert: &Alert, action: CanonicalAction) -> Result<Outcome, RelayError> {
        let symbol = alert.ticker()?;

        let position: Option<Position> = self.broker.get_position(symbol).await?;
        let Some(position) = position else {
            info!(symbol, "exit signal with no open position, nothing to do");
            return Ok(Outcome::NoOp {
                action,
                reason: format!("no open position for {symbol}"),
            });
        };
        if position.qty <= 0.0 {
            return Ok(Outcome::NoOp {
                action,
                reason: format!("open position for {symbol} has zero quantity"),
            });
        }

        // The open position decides the closing side; the alert only
        // requests the close.
        let side = match position.side {
            PositionSide::Long => Side::Sell,
            PositionSide::Short => Side::Buy,
        };

        let order = OrderRequest {
            symbol: symbol.to_string(),
            qty: position.qty,
            side,
            order_type: OrderType::Market,
            time_in_force: TimeInForce::Day,
            limit_price: None,
            extended_hours: false,
            client_order_id: client_order_id(symbol, action, alert.signal_id.as_deref()),
        };

        info!(
            symbol,
            side = side.as_str(),
            qty = position.qty,
            client_order_id = %order.client_order_id,
            "closing position"
        );
        let ack = self.broker.submit_order(&order).await?;
        Ok(Outcome::Submitted { action, ack })
    }
}

/// Quantity committed per entry: a fixed fraction of live buying power at
/// the alert price, rounded to 6 decimal places.
pub fn risk_sized_qty(buying_power: f64, risk_pct: f64, price: f64) -> f64 {
    round6(buying_power * risk_pct / price)
}

pub fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

/// Deterministic idempotency key for one signal.
///
/// Falls back to the current Unix timestamp when the sender omitted a
/// signal_id. Second-granularity wall clock is a weak substitute: two
/// distinct alerts inside the same second collide, and a retry crossing a
/// second boundary is not deduplicated. Kept for compatibility with
/// senders that never set signal_id.
pub fn client_order_id(symbol: &str, action: CanonicalAction, signal_id: Option<&str>) -> String {
    let id = match signal_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => Utc::now().timestamp().to_string(),
    };

    let mut key = format!("tv_{}_{}_{}", symbol.to_lowercase(), action.key_token(), id);
    if key.len() > CLIENT_ORDER_ID_MAX {
        // Symbols come straight off the wire and may be multi-byte; cut on
        // a char boundary so truncation cannot panic mid-character.
        let mut cut = CLIENT_ORDER_ID_MAX;
        while !key.is_char_boundary(cut) {
            cut -= 1;
        }
        key.truncate(cut);
    }
    key
}

/// Market order while the exchange is open; limit at the alert price with
/// extended_hours while it is closed, so off-hours alerts can still fill
/// in pre/post-market sessions instead of being dropped.
fn shape_entry(
    symbol: &str,
    qty: f64,
    side: Side,
    price: f64,
    market_open: bool,
    action: CanonicalAction,
    alert: &Alert,
) -> OrderRequest {
    let (order_type, limit_price, extended_hours) = if market_open {
        (OrderType::Market, None, false)
    } else {
        (OrderType::Limit, Some(price), true)
    };

    OrderRequest {
        symbol: symbol.to_string(),
        qty,
        side,
        order_type,
        time_in_force: TimeInForce::Day,
        limit_price,
        extended_hours,
        client_order_id: client_order_id(symbol, action, alert.signal_id.as_deref()),
    }
}
