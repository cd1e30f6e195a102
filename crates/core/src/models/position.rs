use serde::{Deserialize, Serialize};

use super::corporate_event::CorporateEvent;
use super::transaction::Transaction;

/// Aggregated holding in one ticker, derived from its transactions and
/// processed corporate events. Never persisted; rebuilt on every load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedPosition {
    pub symbol: String,
    pub company_name: String,

    /// Running share count; zero or negative means fully sold
    pub total_shares: f64,

    /// Weighted-average cost per share
    pub average_price: f64,

    /// Running cost basis (signed)
    pub total_invested: f64,

    /// Dividends dated within the trailing twelve months
    pub dividends_received_12m: f64,

    /// `dividends_received_12m / |total_invested| × 100`
    pub dividend_yield: f64,

    pub current_price: Option<f64>,
    pub current_value: Option<f64>,
    pub profit_loss: Option<f64>,
    pub profit_loss_percent: Option<f64>,
    pub fair_price: Option<f64>,
    pub safety_margin: Option<f64>,

    /// Transactions for this symbol, most recent first
    pub transactions: Vec<Transaction>,

    /// Every event recorded for this symbol (processed or not), oldest first
    pub corporate_events: Vec<CorporateEvent>,

    pub is_sold_out: bool,
}

impl CalculatedPosition {
    pub fn safety_margin_rating(&self) -> Option<SafetyMarginRating> {
        self.safety_margin.map(SafetyMarginRating::classify)
    }
}

/// Presentation policy for a safety margin percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyMarginRating {
    /// 20% or more below fair value
    Excellent,
    /// Between fair value and 20% below it
    Low,
    /// Trading above fair value
    Overvalued,
}

impl SafetyMarginRating {
    /// Percentage from which a margin is rated excellent.
    pub const EXCELLENT_THRESHOLD: f64 = 20.0;

    pub fn classify(margin: f64) -> Self {
        Self::classify_with_threshold(margin, Self::EXCELLENT_THRESHOLD)
    }

    pub fn classify_with_threshold(margin: f64, excellent_threshold: f64) -> Self {
        if margin >= excellent_threshold {
            SafetyMarginRating::Excellent
        } else if margin >= 0.0 {
            SafetyMarginRating::Low
        } else {
            SafetyMarginRating::Overvalued
        }
    }
}

impl std::fmt::Display for SafetyMarginRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyMarginRating::Excellent => write!(f, "Excellent"),
            SafetyMarginRating::Low => write!(f, "Low"),
            SafetyMarginRating::Overvalued => write!(f, "Overvalued"),
        }
    }
}

/// Column a position list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSortKey {
    /// Lexicographic by ticker
    Symbol,
    /// By absolute invested capital
    Invested,
    /// By unrealized profit/loss (missing counts as zero)
    ProfitLoss,
    DividendYield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}
