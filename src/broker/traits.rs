use async_trait::async_trait;

use crate::error::BrokerError;

use super::types::{AccountSnapshot, AssetSnapshot, MarketClock, OrderAck, OrderRequest, Position};

pub type BrokerResult<T> = Result<T, BrokerError>;

/// One method per brokerage REST operation the relay performs. Injected
/// into the decision engine so tests can substitute a scripted fake.
#[async_trait]
pub trait BrokerApi: Send + Sync {
    async fn get_account(&self) -> BrokerResult<AccountSnapshot>;
    async fn get_asset(&self, symbol: &str) -> BrokerResult<AssetSnapshot>;
    async fn get_clock(&self) -> BrokerResult<MarketClock>;

    /// Ok(None) when no position is open for the symbol. A missing
    /// position is a valid terminal state for exits, not an error.
    async fn get_position(&self, symbol: &str) -> BrokerResult<Option<Position>>;

    async fn submit_order(&self, order: &OrderRequest) -> BrokerResult<OrderAck>;
}
