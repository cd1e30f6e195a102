use log::warn;

use crate::models::position::{CalculatedPosition, SafetyMarginRating};
use crate::models::price::{AnnualDividend, FairPriceEstimate};
use crate::models::settings::{Settings, DEFAULT_DISCOUNT_RATE};

/// Derives market value, profit/loss, and safety margin for positions,
/// and dividend-discount fair prices.
///
/// Pure business logic, no I/O. Missing prices are not errors: the
/// dependent fields are simply left as `None`.
pub struct ValuationService {
    discount_rate: f64,
    excellent_margin_threshold: f64,
}

impl ValuationService {
    pub fn new() -> Self {
        Self {
            discount_rate: DEFAULT_DISCOUNT_RATE,
            excellent_margin_threshold: SafetyMarginRating::EXCELLENT_THRESHOLD,
        }
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            discount_rate: settings.discount_rate,
            excellent_margin_threshold: settings.excellent_margin_threshold,
        }
    }

    pub fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    /// Return a copy of `position` valued at the given prices.
    pub fn decorate(
        &self,
        position: &CalculatedPosition,
        current_price: Option<f64>,
        fair_price: Option<f64>,
    ) -> CalculatedPosition {
        let mut decorated = position.clone();
        self.apply_prices(&mut decorated, current_price, fair_price);
        decorated
    }

    /// Value `position` in place. All valuation fields are recomputed from scratch.
    pub(crate) fn apply_prices(
        &self,
        position: &mut CalculatedPosition,
        current_price: Option<f64>,
        fair_price: Option<f64>,
    ) {
        let current = usable_price(&position.symbol, current_price);
        let fair = fair_price.filter(|p| {
            let ok = p.is_finite() && *p >= 0.0;
            if !ok {
                warn!("Ignoring invalid fair price {p} for {}", position.symbol);
            }
            ok
        });

        position.current_price = current;
        position.fair_price = fair;
        position.current_value = None;
        position.profit_loss = None;
        position.profit_loss_percent = None;
        position.safety_margin = None;

        if let Some(price) = current {
            if !position.is_sold_out {
                self.value_holding(position, price);
            }
            if let Some(fair) = fair {
                position.safety_margin = safety_margin(fair, price);
            }
        }
    }

    /// Value `position` at a new market price without persisting it
    /// (live preview while a price is being edited).
    ///
    /// A sold-out position only records the price.
    pub fn reprice(&self, position: &CalculatedPosition, new_price: f64) -> CalculatedPosition {
        let mut repriced = position.clone();
        repriced.current_price = Some(new_price);

        if position.total_shares <= 0.0 {
            return repriced;
        }

        self.value_holding(&mut repriced, new_price);
        repriced.safety_margin = position
            .fair_price
            .and_then(|fair| safety_margin(fair, new_price));
        repriced
    }

    fn value_holding(&self, position: &mut CalculatedPosition, price: f64) {
        let current_value = position.total_shares * price;
        let profit_loss = current_value - position.total_invested;
        position.current_value = Some(current_value);
        position.profit_loss = Some(profit_loss);
        position.profit_loss_percent = Some(if position.total_invested > 0.0 {
            (profit_loss / position.total_invested) * 100.0
        } else {
            0.0
        });
    }

    /// Fair price from a dividend history: average of the valid annual
    /// dividends divided by the discount rate.
    ///
    /// Returns `None` when no entry is a non-negative number.
    pub fn estimate_fair_price(&self, dividends: &[AnnualDividend]) -> Option<FairPriceEstimate> {
        let valid: Vec<(i32, f64)> = dividends
            .iter()
            .filter_map(|d| d.valid_amount().map(|amount| (d.year, amount)))
            .collect();
        if valid.is_empty() {
            return None;
        }

        let average_dividend =
            valid.iter().map(|(_, amount)| amount).sum::<f64>() / valid.len() as f64;
        Some(FairPriceEstimate {
            average_dividend,
            fair_price: average_dividend / self.discount_rate,
            dividend_data: valid.into_iter().collect(),
        })
    }

    /// Rate a safety margin using the configured excellent threshold.
    pub fn rate(&self, margin: f64) -> SafetyMarginRating {
        SafetyMarginRating::classify_with_threshold(margin, self.excellent_margin_threshold)
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

/// `(fair − current) / fair × 100`, defined only for a positive fair price.
pub fn safety_margin(fair_price: f64, current_price: f64) -> Option<f64> {
    (fair_price > 0.0).then(|| ((fair_price - current_price) / fair_price) * 100.0)
}

fn usable_price(symbol: &str, price: Option<f64>) -> Option<f64> {
    match price {
        Some(p) if p.is_finite() && p > 0.0 => Some(p),
        Some(p) => {
            warn!("Ignoring invalid current price {p} for {symbol}");
            None
        }
        None => None,
    }
}
