pub mod errors;
pub mod models;
pub mod services;
pub mod storage;
pub mod stores;

use chrono::NaiveDate;
use log::info;
use models::{
    corporate_event::{CorporateEvent, CorporateEventDraft},
    portfolio::Portfolio,
    position::{CalculatedPosition, SafetyMarginRating},
    price::{AnnualDividend, FairPrice, FairPriceEstimate, PriceMap, StockPrice},
    settings::Settings,
    transaction::{Transaction, TransactionDraft},
};
use services::{
    position_service::PositionService, ranking_service::PositionQuery,
    valuation_service::ValuationService,
};
use storage::manager::StorageManager;
use stores::{
    memory::MemoryStore,
    traits::{CorporateEventStore, PriceStore, TransactionStore},
};
use uuid::Uuid;

use errors::CoreError;

/// Maximum number of years of dividend history used for a fair price.
pub const MAX_FAIR_PRICE_YEARS: usize = 20;

/// Main entry point for the portfolio tracker core library.
///
/// Holds a store and the services that turn its raw records into positions.
/// Positions are never cached: every read fetches the full record set and
/// recomputes, so a mutation is visible on the next read.
#[must_use]
pub struct PortfolioTracker<S = MemoryStore> {
    store: S,
    settings: Settings,
    position_service: PositionService,
    valuation_service: ValuationService,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

/// Everything one position rebuild reads from the store.
struct AggregationInputs {
    transactions: Vec<Transaction>,
    events: Vec<CorporateEvent>,
    current_prices: PriceMap,
    fair_prices: PriceMap,
}

impl<S> std::fmt::Debug for PortfolioTracker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("settings", &self.settings)
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Today's calendar date in the local time zone.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl<S> PortfolioTracker<S>
where
    S: TransactionStore + CorporateEventStore + PriceStore,
{
    /// Wrap any store that provides transactions, corporate events and prices.
    pub fn with_store(store: S, settings: Settings) -> Self {
        let valuation_service = ValuationService::with_settings(&settings);
        let position_service =
            PositionService::with_valuation(ValuationService::with_settings(&settings));
        Self {
            store,
            settings,
            position_service,
            valuation_service,
            dirty: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Positions ───────────────────────────────────────────────────

    /// All positions (sold-out included), as of today.
    pub async fn positions(&self) -> Result<Vec<CalculatedPosition>, CoreError> {
        self.positions_as_of(today()).await
    }

    /// All positions, with the dividend window anchored at `as_of`.
    pub async fn positions_as_of(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<CalculatedPosition>, CoreError> {
        let inputs = self.load_inputs().await?;
        Ok(self.position_service.aggregate(
            &inputs.transactions,
            &inputs.current_prices,
            &inputs.fair_prices,
            &inputs.events,
            as_of,
        ))
    }

    /// Positions that still hold shares, as of today.
    pub async fn active_positions(&self) -> Result<Vec<CalculatedPosition>, CoreError> {
        self.active_positions_as_of(today()).await
    }

    /// Positions that still hold shares, with the dividend window anchored at `as_of`.
    pub async fn active_positions_as_of(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<CalculatedPosition>, CoreError> {
        let inputs = self.load_inputs().await?;
        Ok(self.position_service.aggregate_active(
            &inputs.transactions,
            &inputs.current_prices,
            &inputs.fair_prices,
            &inputs.events,
            as_of,
        ))
    }

    async fn load_inputs(&self) -> Result<AggregationInputs, CoreError> {
        Ok(AggregationInputs {
            transactions: self.store.list_transactions().await?,
            events: self.store.list_corporate_events(None).await?,
            current_prices: self.store.current_prices().await?,
            fair_prices: self.store.fair_prices().await?,
        })
    }

    /// The position for one symbol, if it has any transactions.
    pub async fn position(&self, symbol: &str) -> Result<Option<CalculatedPosition>, CoreError> {
        let symbol = models::transaction::normalize_symbol(symbol);
        Ok(self
            .positions()
            .await?
            .into_iter()
            .find(|p| p.symbol == symbol))
    }

    /// Positions matching the query's search text, in the query's sort order.
    pub async fn query_positions(
        &self,
        query: &PositionQuery,
    ) -> Result<Vec<CalculatedPosition>, CoreError> {
        let positions = self.positions().await?;
        Ok(query.apply(&positions).into_iter().cloned().collect())
    }

    // ── Transactions ────────────────────────────────────────────────

    pub async fn transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        self.store.list_transactions().await
    }

    /// Validate a transaction form and record it.
    pub async fn add_transaction(
        &mut self,
        draft: TransactionDraft,
    ) -> Result<Transaction, CoreError> {
        let transaction = draft.into_transaction()?;
        let created = self.store.create_transaction(transaction).await?;
        self.dirty = true;
        Ok(created)
    }

    /// Replace an existing transaction with a validated form, keeping its id.
    pub async fn update_transaction(
        &mut self,
        id: Uuid,
        draft: TransactionDraft,
    ) -> Result<Transaction, CoreError> {
        let mut transaction = draft.into_transaction()?;
        transaction.id = id;
        let updated = self.store.update_transaction(transaction).await?;
        self.dirty = true;
        Ok(updated)
    }

    pub async fn delete_transaction(&mut self, id: Uuid) -> Result<(), CoreError> {
        self.store.delete_transaction(id).await?;
        self.dirty = true;
        Ok(())
    }

    // ── Corporate Events ────────────────────────────────────────────

    /// Events for `symbol`, or all events.
    pub async fn corporate_events(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<CorporateEvent>, CoreError> {
        self.store.list_corporate_events(symbol).await
    }

    /// Validate an event form and record it as unprocessed.
    pub async fn add_corporate_event(
        &mut self,
        draft: CorporateEventDraft,
    ) -> Result<CorporateEvent, CoreError> {
        let event = draft.into_event()?;
        let created = self.store.create_corporate_event(event).await?;
        self.dirty = true;
        Ok(created)
    }

    /// Replace an event's details, keeping its id and processed flag.
    pub async fn update_corporate_event(
        &mut self,
        id: Uuid,
        draft: CorporateEventDraft,
    ) -> Result<CorporateEvent, CoreError> {
        let existing = self.find_corporate_event(id).await?;
        let mut event = draft.into_event()?;
        event.id = existing.id;
        event.processed = existing.processed;
        let updated = self.store.update_corporate_event(event).await?;
        self.dirty = true;
        Ok(updated)
    }

    /// Flag an event as processed so it adjusts positions from now on.
    pub async fn process_corporate_event(&mut self, id: Uuid) -> Result<CorporateEvent, CoreError> {
        let mut event = self.find_corporate_event(id).await?;
        event.processed = true;
        let updated = self.store.update_corporate_event(event).await?;
        info!(
            "Processed {} event for {} dated {}",
            updated.event_type(),
            updated.symbol,
            updated.event_date
        );
        self.dirty = true;
        Ok(updated)
    }

    pub async fn delete_corporate_event(&mut self, id: Uuid) -> Result<(), CoreError> {
        self.store.delete_corporate_event(id).await?;
        self.dirty = true;
        Ok(())
    }

    async fn find_corporate_event(&self, id: Uuid) -> Result<CorporateEvent, CoreError> {
        self.store
            .list_corporate_events(None)
            .await?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| CoreError::CorporateEventNotFound(id.to_string()))
    }

    // ── Prices ──────────────────────────────────────────────────────

    /// Save the market price of `symbol`. The price must be positive.
    pub async fn set_current_price(
        &mut self,
        symbol: &str,
        price: f64,
    ) -> Result<StockPrice, CoreError> {
        if !(price.is_finite() && price > 0.0) {
            return Err(CoreError::ValidationError(
                "Price must be greater than zero".into(),
            ));
        }
        let saved = self.store.set_stock_price(symbol, price).await?;
        self.dirty = true;
        Ok(saved)
    }

    /// Compute a fair price from the dividend history without saving it.
    #[must_use]
    pub fn estimate_fair_price(&self, dividends: &[AnnualDividend]) -> Option<FairPriceEstimate> {
        self.valuation_service.estimate_fair_price(dividends)
    }

    /// Compute and save the fair price of `symbol` from its dividend history
    /// (one row per analysed year, 1 to 20 rows).
    pub async fn save_fair_price(
        &mut self,
        symbol: &str,
        dividends: &[AnnualDividend],
    ) -> Result<FairPrice, CoreError> {
        if dividends.is_empty() || dividends.len() > MAX_FAIR_PRICE_YEARS {
            return Err(CoreError::ValidationError(format!(
                "Between 1 and {MAX_FAIR_PRICE_YEARS} years of dividends are required"
            )));
        }
        let estimate = self.estimate_fair_price(dividends).ok_or_else(|| {
            CoreError::ValidationError("Enter at least one valid dividend".into())
        })?;

        let record = FairPrice {
            symbol: symbol.to_string(),
            fair_price: estimate.fair_price,
            years_analyzed: dividends.len() as u32,
            average_dividend: estimate.average_dividend,
            dividend_data: estimate.dividend_data,
            updated_at: chrono::Utc::now(),
        };
        let saved = self.store.set_fair_price(record).await?;
        self.dirty = true;
        Ok(saved)
    }

    /// Value `position` at a price being typed in, without saving it.
    /// Non-positive prices leave the position untouched.
    #[must_use]
    pub fn preview_price(&self, position: &CalculatedPosition, price: f64) -> CalculatedPosition {
        if price.is_finite() && price > 0.0 {
            self.valuation_service.reprice(position, price)
        } else {
            position.clone()
        }
    }

    #[must_use]
    pub fn rate_safety_margin(&self, margin: f64) -> SafetyMarginRating {
        self.valuation_service.rate(margin)
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// Export all transactions as a JSON string.
    pub async fn export_transactions_to_json(&self) -> Result<String, CoreError> {
        let transactions = self.store.list_transactions().await?;
        serde_json::to_string_pretty(&transactions).map_err(|e| {
            CoreError::Serialization(format!("Failed to serialize transactions to JSON: {e}"))
        })
    }

    /// Import transactions from a JSON string. Every record is validated
    /// first; if any is invalid, none are imported.
    /// Returns the number of transactions imported.
    pub async fn import_transactions_from_json(&mut self, json: &str) -> Result<usize, CoreError> {
        let mut transactions: Vec<Transaction> = serde_json::from_str(json)?;

        for transaction in &mut transactions {
            transaction.normalize();
            let errors = transaction.validate();
            if !errors.is_empty() {
                return Err(CoreError::ValidationError(format!(
                    "Transaction {}: {}",
                    transaction.id,
                    errors.join("; ")
                )));
            }
        }

        let count = transactions.len();
        for transaction in transactions {
            self.store.create_transaction(transaction).await?;
        }
        if count > 0 {
            self.dirty = true;
        }
        info!("Imported {count} transactions");
        Ok(count)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Set the currency label (e.g., "BRL", "USD"). Must be 3 ASCII letters.
    pub fn set_display_currency(&mut self, currency: &str) -> Result<(), CoreError> {
        let trimmed = currency.trim().to_uppercase();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code '{currency}': must be exactly 3 ASCII letters (e.g., BRL, USD)"
            )));
        }
        self.settings.display_currency = trimmed;
        self.dirty = true;
        Ok(())
    }

    /// Set the fair price discount rate, strictly between 0 and 1.
    /// Already saved fair prices are not recomputed.
    pub fn set_discount_rate(&mut self, rate: f64) -> Result<(), CoreError> {
        if !(rate.is_finite() && rate > 0.0 && rate < 1.0) {
            return Err(CoreError::ValidationError(format!(
                "Discount rate {rate} must be between 0 and 1 (e.g., 0.06 for 6%)"
            )));
        }
        self.settings.discount_rate = rate;
        self.rebuild_services();
        self.dirty = true;
        Ok(())
    }

    /// Returns `true` if anything has changed since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    fn rebuild_services(&mut self) {
        self.valuation_service = ValuationService::with_settings(&self.settings);
        self.position_service =
            PositionService::with_valuation(ValuationService::with_settings(&self.settings));
    }
}

impl PortfolioTracker<MemoryStore> {
    /// Create a brand new empty portfolio with default settings.
    pub fn create_new() -> Self {
        Self::from_portfolio(Portfolio::default())
    }

    /// Open an in-memory portfolio (e.g., one loaded elsewhere).
    pub fn from_portfolio(portfolio: Portfolio) -> Self {
        let settings = portfolio.settings.clone();
        Self::with_store(MemoryStore::from_portfolio(portfolio), settings)
    }

    /// Load a portfolio from snapshot bytes.
    /// Use this where the host handles file I/O (WASM, desktop shells).
    pub fn load_from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let portfolio = StorageManager::load_from_bytes(bytes)?;
        Ok(Self::from_portfolio(portfolio))
    }

    /// Save the portfolio to snapshot bytes.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, CoreError> {
        self.sync_settings();
        let bytes = StorageManager::save_to_bytes(self.store.portfolio())?;
        self.dirty = false;
        Ok(bytes)
    }

    /// Load from a snapshot file on disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str) -> Result<Self, CoreError> {
        let portfolio = StorageManager::load_from_file(path)?;
        Ok(Self::from_portfolio(portfolio))
    }

    /// Save to a snapshot file on disk (native only, not WASM).
    /// Clears the unsaved-changes flag on success.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(&mut self, path: &str) -> Result<(), CoreError> {
        self.sync_settings();
        StorageManager::save_to_file(self.store.portfolio(), path)?;
        self.dirty = false;
        Ok(())
    }

    /// Export the whole portfolio (records, prices, settings) as JSON.
    pub fn to_json(&mut self) -> Result<String, CoreError> {
        self.sync_settings();
        serde_json::to_string_pretty(self.store.portfolio())
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize portfolio: {e}")))
    }

    fn sync_settings(&mut self) {
        self.store.portfolio_mut().settings = self.settings.clone();
    }
}
