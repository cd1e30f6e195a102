use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calendar::parse_calendar_date;
use crate::errors::CoreError;

/// Relative slack allowed between a stored total and `quantity × price`.
const TOTAL_TOLERANCE: f64 = 1e-9;

/// Kind of cash event recorded against a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Shares bought at a unit price
    Buy,
    /// Shares sold at a unit price
    Sell,
    /// Cash dividend received; carries no shares
    Dividend,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "buy"),
            TransactionKind::Sell => write!(f, "sell"),
            TransactionKind::Dividend => write!(f, "dividend"),
        }
    }
}

/// One recorded buy, sell or dividend for a symbol.
///
/// For buy/sell, `total = quantity × price`. For dividends `quantity` is 0
/// and `total` is the cash amount received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,

    /// Ticker symbol, uppercased (e.g., "ITSA4", "TAEE11")
    pub symbol: String,

    pub company_name: String,

    pub kind: TransactionKind,

    /// Number of shares (0 for dividends)
    pub quantity: f64,

    /// Unit price, or the cash amount for dividends
    pub price: f64,

    pub total: f64,

    /// Calendar date of the trade (no time component)
    pub date: NaiveDate,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    fn new(
        kind: TransactionKind,
        symbol: impl Into<String>,
        company_name: impl Into<String>,
        quantity: f64,
        price: f64,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        let (quantity, total) = match kind {
            TransactionKind::Dividend => (0.0, price),
            TransactionKind::Buy | TransactionKind::Sell => (quantity, quantity * price),
        };
        Self {
            id: Uuid::new_v4(),
            symbol: normalize_symbol(&symbol.into()),
            company_name: company_name.into().trim().to_string(),
            kind,
            quantity,
            price,
            total,
            date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn buy(
        symbol: impl Into<String>,
        company_name: impl Into<String>,
        quantity: f64,
        price: f64,
        date: NaiveDate,
    ) -> Self {
        Self::new(TransactionKind::Buy, symbol, company_name, quantity, price, date)
    }

    pub fn sell(
        symbol: impl Into<String>,
        company_name: impl Into<String>,
        quantity: f64,
        price: f64,
        date: NaiveDate,
    ) -> Self {
        Self::new(TransactionKind::Sell, symbol, company_name, quantity, price, date)
    }

    /// A cash dividend of `amount` received on `date`.
    pub fn dividend(
        symbol: impl Into<String>,
        company_name: impl Into<String>,
        amount: f64,
        date: NaiveDate,
    ) -> Self {
        Self::new(TransactionKind::Dividend, symbol, company_name, 0.0, amount, date)
    }

    /// Re-run input validation against an already built record
    /// (used when importing records that bypassed the draft form).
    ///
    /// Beyond the form checks, the stored amounts must agree: buys and
    /// sells need `total = quantity × price`, dividends need a zero quantity.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = TransactionDraft::from(self).validate();
        match self.kind {
            TransactionKind::Buy | TransactionKind::Sell => {
                let expected = self.quantity * self.price;
                let tolerance = TOTAL_TOLERANCE * expected.abs().max(1.0);
                if !self.total.is_finite() || (self.total - expected).abs() > tolerance {
                    errors.push(format!(
                        "Total {} does not match quantity × price ({expected})",
                        self.total
                    ));
                }
            }
            TransactionKind::Dividend => {
                if self.quantity != 0.0 {
                    errors.push("Dividend quantity must be zero".to_string());
                }
            }
        }
        errors
    }

    /// Trim and uppercase the symbol and trim the company name, the same
    /// way the constructors do.
    pub fn normalize(&mut self) {
        self.symbol = normalize_symbol(&self.symbol);
        self.company_name = self.company_name.trim().to_string();
    }
}

/// Uppercase and trim a ticker so lookups are consistent.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Raw transaction form input, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub symbol: String,
    pub company_name: String,
    pub kind: Option<TransactionKind>,
    pub quantity: f64,
    pub price: f64,
    /// `YYYY-MM-DD`
    pub date: String,
}

impl TransactionDraft {
    /// Check the form; an empty list means the draft can be submitted.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.symbol.trim().is_empty() {
            errors.push("Symbol is required".to_string());
        }
        if self.company_name.trim().is_empty() {
            errors.push("Company name is required".to_string());
        }
        if self.kind.is_none() {
            errors.push("Transaction type is required".to_string());
        }
        if self.date.trim().is_empty() {
            errors.push("Date is required".to_string());
        } else if parse_calendar_date(&self.date).is_none() {
            errors.push(format!("Invalid date '{}': use YYYY-MM-DD", self.date));
        }

        let needs_quantity = matches!(
            self.kind,
            Some(TransactionKind::Buy) | Some(TransactionKind::Sell)
        );
        if needs_quantity && !(self.quantity.is_finite() && self.quantity > 0.0) {
            errors.push("Quantity must be greater than zero".to_string());
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            errors.push("Price must be greater than zero".to_string());
        }

        errors
    }

    /// Validate and build the stored record.
    pub fn into_transaction(self) -> Result<Transaction, CoreError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(CoreError::from_messages(&errors));
        }
        let (Some(kind), Some(date)) = (self.kind, parse_calendar_date(&self.date)) else {
            return Err(CoreError::ValidationError(
                "Transaction type and date are required".into(),
            ));
        };
        Ok(Transaction::new(
            kind,
            self.symbol,
            self.company_name,
            self.quantity,
            self.price,
            date,
        ))
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(t: &Transaction) -> Self {
        Self {
            symbol: t.symbol.clone(),
            company_name: t.company_name.clone(),
            kind: Some(t.kind),
            quantity: t.quantity,
            price: t.price,
            date: t.date.format(super::calendar::DATE_FORMAT).to_string(),
        }
    }
}
