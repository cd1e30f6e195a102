use async_trait::async_trait;
use chrono::Utc;
use log::info;
use uuid::Uuid;

use super::traits::{CorporateEventStore, PriceStore, TransactionStore};
use crate::errors::CoreError;
use crate::models::corporate_event::CorporateEvent;
use crate::models::portfolio::Portfolio;
use crate::models::price::{FairPrice, PriceMap, StockPrice};
use crate::models::transaction::{normalize_symbol, Transaction};

/// On-device store backed by a [`Portfolio`] held in memory.
///
/// Persist it with [`StorageManager`](crate::storage::manager::StorageManager)
/// via [`portfolio`](Self::portfolio) / [`from_portfolio`](Self::from_portfolio).
/// New records are kept newest first.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    portfolio: Portfolio,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_portfolio(portfolio: Portfolio) -> Self {
        Self { portfolio }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn portfolio_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }

    pub fn into_portfolio(self) -> Portfolio {
        self.portfolio
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl TransactionStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        Ok(self.portfolio.transactions.clone())
    }

    async fn create_transaction(
        &mut self,
        transaction: Transaction,
    ) -> Result<Transaction, CoreError> {
        info!(
            "Recording {} of {} {} on {}",
            transaction.kind, transaction.quantity, transaction.symbol, transaction.date
        );
        self.portfolio.transactions.insert(0, transaction.clone());
        Ok(transaction)
    }

    async fn update_transaction(
        &mut self,
        mut transaction: Transaction,
    ) -> Result<Transaction, CoreError> {
        let existing = self
            .portfolio
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction.id)
            .ok_or_else(|| CoreError::TransactionNotFound(transaction.id.to_string()))?;

        transaction.created_at = existing.created_at;
        transaction.updated_at = Utc::now();
        *existing = transaction.clone();
        Ok(transaction)
    }

    async fn delete_transaction(&mut self, id: Uuid) -> Result<(), CoreError> {
        let idx = self
            .portfolio
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        let removed = self.portfolio.transactions.remove(idx);
        info!("Deleted {} transaction {} for {}", removed.kind, id, removed.symbol);
        Ok(())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl CorporateEventStore for MemoryStore {
    async fn list_corporate_events(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<CorporateEvent>, CoreError> {
        let events = match symbol {
            Some(symbol) => {
                let symbol = normalize_symbol(symbol);
                self.portfolio
                    .corporate_events
                    .iter()
                    .filter(|e| e.symbol == symbol)
                    .cloned()
                    .collect()
            }
            None => self.portfolio.corporate_events.clone(),
        };
        Ok(events)
    }

    async fn create_corporate_event(
        &mut self,
        event: CorporateEvent,
    ) -> Result<CorporateEvent, CoreError> {
        info!("Recording {} event for {}", event.event_type(), event.symbol);
        self.portfolio.corporate_events.insert(0, event.clone());
        Ok(event)
    }

    async fn update_corporate_event(
        &mut self,
        mut event: CorporateEvent,
    ) -> Result<CorporateEvent, CoreError> {
        let existing = self
            .portfolio
            .corporate_events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| CoreError::CorporateEventNotFound(event.id.to_string()))?;

        event.created_at = existing.created_at;
        event.updated_at = Utc::now();
        *existing = event.clone();
        Ok(event)
    }

    async fn delete_corporate_event(&mut self, id: Uuid) -> Result<(), CoreError> {
        let idx = self
            .portfolio
            .corporate_events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CoreError::CorporateEventNotFound(id.to_string()))?;
        self.portfolio.corporate_events.remove(idx);
        info!("Deleted corporate event {id}");
        Ok(())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceStore for MemoryStore {
    async fn current_prices(&self) -> Result<PriceMap, CoreError> {
        Ok(self
            .portfolio
            .stock_prices
            .values()
            .map(|p| (p.symbol.clone(), p.current_price))
            .collect())
    }

    async fn fair_prices(&self) -> Result<PriceMap, CoreError> {
        Ok(self
            .portfolio
            .fair_prices
            .values()
            .map(|p| (p.symbol.clone(), p.fair_price))
            .collect())
    }

    async fn get_stock_price(&self, symbol: &str) -> Result<Option<StockPrice>, CoreError> {
        Ok(self
            .portfolio
            .stock_prices
            .get(&normalize_symbol(symbol))
            .cloned())
    }

    async fn set_stock_price(
        &mut self,
        symbol: &str,
        price: f64,
    ) -> Result<StockPrice, CoreError> {
        let record = StockPrice {
            symbol: normalize_symbol(symbol),
            current_price: price,
            updated_at: Utc::now(),
        };
        self.portfolio
            .stock_prices
            .insert(record.symbol.clone(), record.clone());
        Ok(record)
    }

    async fn get_fair_price(&self, symbol: &str) -> Result<Option<FairPrice>, CoreError> {
        Ok(self
            .portfolio
            .fair_prices
            .get(&normalize_symbol(symbol))
            .cloned())
    }

    async fn set_fair_price(&mut self, mut fair_price: FairPrice) -> Result<FairPrice, CoreError> {
        fair_price.symbol = normalize_symbol(&fair_price.symbol);
        fair_price.updated_at = Utc::now();
        self.portfolio
            .fair_prices
            .insert(fair_price.symbol.clone(), fair_price.clone());
        Ok(fair_price)
    }
}
