use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Symbol → price lookup handed to the position aggregator.
pub type PriceMap = HashMap<String, f64>;

/// Last market price entered for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPrice {
    pub symbol: String,
    pub current_price: f64,
    pub updated_at: DateTime<Utc>,
}

/// Persisted fair price estimate and the dividend history it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairPrice {
    pub symbol: String,
    pub fair_price: f64,
    pub years_analyzed: u32,
    pub average_dividend: f64,
    /// Year → dividend per share paid that year
    pub dividend_data: BTreeMap<i32, f64>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the dividend history form: a year and whatever the user typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualDividend {
    pub year: i32,
    pub amount: String,
}

impl AnnualDividend {
    pub fn new(year: i32, amount: impl Into<String>) -> Self {
        Self {
            year,
            amount: amount.into(),
        }
    }

    /// The amount when it is a finite, non-negative number.
    pub fn valid_amount(&self) -> Option<f64> {
        self.amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
    }
}

/// Result of a dividend-discount fair price calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairPriceEstimate {
    pub average_dividend: f64,
    pub fair_price: f64,
    /// Valid entries only
    pub dividend_data: BTreeMap<i32, f64>,
}
