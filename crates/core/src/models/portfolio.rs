use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::corporate_event::CorporateEvent;
use super::price::{FairPrice, StockPrice};
use super::settings::Settings;
use super::transaction::Transaction;

/// The main data container. Everything in here gets serialized and saved
/// to the portable snapshot file.
///
/// Positions are not stored: they are recomputed from these raw records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Raw transactions, newest first
    pub transactions: Vec<Transaction>,

    /// Raw corporate events, newest first
    pub corporate_events: Vec<CorporateEvent>,

    /// Latest market price per symbol
    pub stock_prices: HashMap<String, StockPrice>,

    /// Dividend-derived fair price per symbol
    pub fair_prices: HashMap<String, FairPrice>,

    pub settings: Settings,
}
