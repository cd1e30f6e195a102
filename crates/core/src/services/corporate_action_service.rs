use log::debug;

use crate::models::corporate_event::{CorporateAction, CorporateEvent, EventAdjustment};

/// Applies corporate actions (splits, bonuses, mergers, spin-offs) to share counts.
///
/// Stateless; no I/O.
pub struct CorporateActionService;

impl CorporateActionService {
    pub fn new() -> Self {
        Self
    }

    /// Compute what `event` does to a holding of `current_shares`.
    ///
    /// Fractional shares produced by a ratio are dropped (floored). Events
    /// with a zero or non-finite ratio leave the holding unchanged; such
    /// events are rejected at creation time, so this only guards old data.
    pub fn compute_adjustment(&self, event: &CorporateEvent, current_shares: f64) -> EventAdjustment {
        let mut adjustment = EventAdjustment::unchanged(current_shares);

        match &event.action {
            // Both kinds use the same formula: ratio_from old shares become ratio_to.
            CorporateAction::Split {
                ratio_from,
                ratio_to,
            }
            | CorporateAction::ReverseSplit {
                ratio_from,
                ratio_to,
            } => {
                if *ratio_from > 0 && *ratio_to > 0 {
                    let ratio = f64::from(*ratio_to) / f64::from(*ratio_from);
                    adjustment.new_quantity = (current_shares * ratio).floor();
                    adjustment.price_adjustment_factor = 1.0 / ratio;
                }
            }
            CorporateAction::Bonus {
                bonus_shares_per_old,
            } => {
                if is_usable_ratio(*bonus_shares_per_old) {
                    let bonus_shares = (current_shares * bonus_shares_per_old).floor();
                    adjustment.new_quantity = current_shares + bonus_shares;
                    if adjustment.new_quantity != 0.0 {
                        adjustment.price_adjustment_factor =
                            current_shares / adjustment.new_quantity;
                    }
                }
            }
            CorporateAction::Merger {
                cash_per_share,
                new_shares_per_old,
                ..
            } => {
                adjustment.new_symbol_quantity =
                    Some((current_shares * non_negative(*new_shares_per_old)).floor());
                adjustment.cash_received = Some(current_shares * non_negative(*cash_per_share));
                adjustment.new_quantity = 0.0;
            }
            CorporateAction::Spinoff {
                new_shares_per_old,
                ..
            } => {
                if is_usable_ratio(*new_shares_per_old) {
                    adjustment.new_symbol_quantity =
                        Some((current_shares * new_shares_per_old).floor());
                }
            }
        }

        adjustment
    }

    /// Apply the processed events of one symbol, in the order given
    /// (callers sort by event date first), and return the final share count.
    pub fn apply_processed(&self, events: &[CorporateEvent], mut shares: f64) -> f64 {
        for event in events.iter().filter(|e| e.processed) {
            let adjustment = self.compute_adjustment(event, shares);
            debug!(
                "{} {} on {}: {} -> {} shares (price factor {:.6})",
                event.symbol,
                event.event_type(),
                event.event_date,
                adjustment.old_quantity,
                adjustment.new_quantity,
                adjustment.price_adjustment_factor
            );
            shares = adjustment.new_quantity;
        }
        shares
    }
}

impl Default for CorporateActionService {
    fn default() -> Self {
        Self::new()
    }
}

fn is_usable_ratio(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
