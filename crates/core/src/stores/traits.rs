use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::corporate_event::CorporateEvent;
use crate::models::price::{FairPrice, PriceMap, StockPrice};
use crate::models::transaction::Transaction;

/// Where raw transactions live (on-device snapshot, remote database, ...).
///
/// The position engine only ever reads full snapshots through `list_transactions`;
/// the mutations exist for the surrounding application.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait TransactionStore: Send + Sync {
    /// Human-readable name of this store (for logs/errors).
    fn name(&self) -> &str;

    async fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError>;

    async fn create_transaction(&mut self, transaction: Transaction)
        -> Result<Transaction, CoreError>;

    /// Replace the record with the same id. Fails with `TransactionNotFound`.
    async fn update_transaction(&mut self, transaction: Transaction)
        -> Result<Transaction, CoreError>;

    /// Fails with `TransactionNotFound` for an unknown id.
    async fn delete_transaction(&mut self, id: Uuid) -> Result<(), CoreError>;
}

/// Where raw corporate events live.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait CorporateEventStore: Send + Sync {
    /// All events, or only those recorded for `symbol`.
    async fn list_corporate_events(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<CorporateEvent>, CoreError>;

    async fn create_corporate_event(
        &mut self,
        event: CorporateEvent,
    ) -> Result<CorporateEvent, CoreError>;

    /// Replace the event with the same id. Fails with `CorporateEventNotFound`.
    async fn update_corporate_event(
        &mut self,
        event: CorporateEvent,
    ) -> Result<CorporateEvent, CoreError>;

    async fn delete_corporate_event(&mut self, id: Uuid) -> Result<(), CoreError>;
}

/// Where current market prices and fair price estimates live.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PriceStore: Send + Sync {
    /// Symbol → last entered market price.
    async fn current_prices(&self) -> Result<PriceMap, CoreError>;

    /// Symbol → saved fair price.
    async fn fair_prices(&self) -> Result<PriceMap, CoreError>;

    async fn get_stock_price(&self, symbol: &str) -> Result<Option<StockPrice>, CoreError>;

    /// Insert or overwrite the market price of `symbol`.
    async fn set_stock_price(&mut self, symbol: &str, price: f64)
        -> Result<StockPrice, CoreError>;

    async fn get_fair_price(&self, symbol: &str) -> Result<Option<FairPrice>, CoreError>;

    /// Insert or overwrite the fair price record for its symbol.
    async fn set_fair_price(&mut self, fair_price: FairPrice) -> Result<FairPrice, CoreError>;
}
