use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashMap;

use super::corporate_action_service::CorporateActionService;
use super::ranking_service::RankingService;
use super::valuation_service::ValuationService;
use crate::models::calendar::twelve_months_before;
use crate::models::corporate_event::CorporateEvent;
use crate::models::position::CalculatedPosition;
use crate::models::price::PriceMap;
use crate::models::transaction::{Transaction, TransactionKind};

/// Cost basis below this (in absolute value) is treated as zero when
/// deriving per-share figures.
pub const MIN_COST_BASIS: f64 = 0.01;

/// Folds raw transactions and corporate events into one position per symbol.
///
/// No I/O. Inputs are only read; every call rebuilds
/// the whole position set from scratch.
pub struct PositionService {
    corporate_actions: CorporateActionService,
    valuation: ValuationService,
    ranking: RankingService,
}

/// Running state for one symbol during the fold.
struct Accumulator {
    symbol: String,
    company_name: String,
    total_shares: f64,
    total_invested: f64,
    dividends_received_12m: f64,
    transactions: Vec<Transaction>,
    corporate_events: Vec<CorporateEvent>,
}

impl Accumulator {
    fn new(transaction: &Transaction) -> Self {
        Self {
            symbol: transaction.symbol.clone(),
            company_name: transaction.company_name.clone(),
            total_shares: 0.0,
            total_invested: 0.0,
            dividends_received_12m: 0.0,
            transactions: Vec::new(),
            corporate_events: Vec::new(),
        }
    }

    fn record(&mut self, transaction: &Transaction, window: (NaiveDate, NaiveDate)) {
        match transaction.kind {
            TransactionKind::Buy => {
                self.total_shares += transaction.quantity;
                self.total_invested += transaction.total;
            }
            TransactionKind::Sell => {
                // Weighted-average cost: selling keeps the average unchanged.
                let average = if self.total_shares > 0.0 {
                    self.total_invested / self.total_shares
                } else {
                    0.0
                };
                if transaction.quantity > self.total_shares {
                    warn!(
                        "Sell of {} {} on {} exceeds the {} shares held",
                        transaction.quantity, self.symbol, transaction.date, self.total_shares
                    );
                }
                self.total_shares -= transaction.quantity;
                self.total_invested -= average * transaction.quantity;
            }
            TransactionKind::Dividend => {
                let (start, end) = window;
                if transaction.date >= start && transaction.date <= end {
                    self.dividends_received_12m += transaction.total;
                }
            }
        }
        self.transactions.push(transaction.clone());
    }

    fn into_position(mut self) -> CalculatedPosition {
        let cost_basis = self.total_invested.abs();
        let (average_price, dividend_yield) = if cost_basis > MIN_COST_BASIS {
            (
                cost_basis / self.total_shares.max(1.0),
                (self.dividends_received_12m / cost_basis) * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        // Most recent first; stable, so same-day records keep input order.
        self.transactions.sort_by(|a, b| b.date.cmp(&a.date));

        CalculatedPosition {
            is_sold_out: self.total_shares <= 0.0,
            symbol: self.symbol,
            company_name: self.company_name,
            total_shares: self.total_shares,
            average_price,
            total_invested: self.total_invested,
            dividends_received_12m: self.dividends_received_12m,
            dividend_yield,
            current_price: None,
            current_value: None,
            profit_loss: None,
            profit_loss_percent: None,
            fair_price: None,
            safety_margin: None,
            transactions: self.transactions,
            corporate_events: self.corporate_events,
        }
    }
}

impl PositionService {
    pub fn new() -> Self {
        Self::with_valuation(ValuationService::new())
    }

    /// Use a valuation service configured from user settings.
    pub fn with_valuation(valuation: ValuationService) -> Self {
        Self {
            corporate_actions: CorporateActionService::new(),
            valuation,
            ranking: RankingService::new(),
        }
    }

    /// Build every position, including sold-out ones, ranked active first
    /// and then by invested capital.
    ///
    /// `as_of` anchors the trailing twelve-month dividend window; dividends
    /// dated after it are left out of the window total. Prices for
    /// unknown symbols and events for symbols without transactions are ignored.
    pub fn aggregate(
        &self,
        transactions: &[Transaction],
        current_prices: &PriceMap,
        fair_prices: &PriceMap,
        corporate_events: &[CorporateEvent],
        as_of: NaiveDate,
    ) -> Vec<CalculatedPosition> {
        let window_start = twelve_months_before(as_of);

        // Encounter order is kept so ties in the final ranking are stable.
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut buckets: Vec<Accumulator> = Vec::new();

        for transaction in transactions {
            let slot = *index.entry(transaction.symbol.as_str()).or_insert_with(|| {
                buckets.push(Accumulator::new(transaction));
                buckets.len() - 1
            });
            buckets[slot].record(transaction, (window_start, as_of));
        }

        for event in corporate_events {
            match index.get(event.symbol.as_str()) {
                Some(&slot) => buckets[slot].corporate_events.push(event.clone()),
                None => debug!(
                    "Dropping {} event for {}: no transactions recorded",
                    event.event_type(),
                    event.symbol
                ),
            }
        }

        let mut positions: Vec<CalculatedPosition> = buckets
            .into_iter()
            .map(|mut bucket| {
                bucket.corporate_events.sort_by_key(|e| e.event_date);
                bucket.total_shares = self
                    .corporate_actions
                    .apply_processed(&bucket.corporate_events, bucket.total_shares);

                let mut position = bucket.into_position();
                let current = current_prices.get(&position.symbol).copied();
                let fair = fair_prices.get(&position.symbol).copied();
                self.valuation.apply_prices(&mut position, current, fair);
                position
            })
            .collect();

        self.ranking.rank(&mut positions);

        debug!(
            "Aggregated {} transactions and {} corporate events into {} positions",
            transactions.len(),
            corporate_events.len(),
            positions.len()
        );
        positions
    }

    /// Same as [`aggregate`](Self::aggregate), keeping only positions that
    /// still hold shares.
    pub fn aggregate_active(
        &self,
        transactions: &[Transaction],
        current_prices: &PriceMap,
        fair_prices: &PriceMap,
        corporate_events: &[CorporateEvent],
        as_of: NaiveDate,
    ) -> Vec<CalculatedPosition> {
        self.ranking.active_only(self.aggregate(
            transactions,
            current_prices,
            fair_prices,
            corporate_events,
            as_of,
        ))
    }
}

impl Default for PositionService {
    fn default() -> Self {
        Self::new()
    }
}
