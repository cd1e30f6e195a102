use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::position::{CalculatedPosition, PositionSortKey, SortDirection};

/// Orders and filters position sets for display.
pub struct RankingService;

impl RankingService {
    pub fn new() -> Self {
        Self
    }

    /// Active positions first, then sold-out ones; each group by
    /// absolute invested capital, largest first.
    pub fn rank(&self, positions: &mut [CalculatedPosition]) {
        positions.sort_by(|a, b| {
            a.is_sold_out.cmp(&b.is_sold_out).then_with(|| {
                b.total_invested
                    .abs()
                    .partial_cmp(&a.total_invested.abs())
                    .unwrap_or(Ordering::Equal)
            })
        });
    }

    /// Drop sold-out positions, keeping the order of the rest.
    pub fn active_only(&self, positions: Vec<CalculatedPosition>) -> Vec<CalculatedPosition> {
        positions.into_iter().filter(|p| !p.is_sold_out).collect()
    }
}

impl Default for RankingService {
    fn default() -> Self {
        Self::new()
    }
}

/// Search box plus sortable column headers over a position list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionQuery {
    /// Case-insensitive substring of the symbol or company name
    pub search: String,
    pub sort_key: PositionSortKey,
    pub direction: SortDirection,
}

impl Default for PositionQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort_key: PositionSortKey::Invested,
            direction: SortDirection::Desc,
        }
    }
}

impl PositionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Clicking the active column flips its direction; clicking another
    /// column switches to it, descending.
    pub fn select_sort(&mut self, key: PositionSortKey) {
        if self.sort_key == key {
            self.direction = self.direction.toggled();
        } else {
            self.sort_key = key;
            self.direction = SortDirection::Desc;
        }
    }

    pub fn matches(&self, position: &CalculatedPosition) -> bool {
        let needle = self.search.to_lowercase();
        position.symbol.to_lowercase().contains(&needle)
            || position.company_name.to_lowercase().contains(&needle)
    }

    /// Filter by the search text, then sort by the selected column.
    pub fn apply<'a>(&self, positions: &'a [CalculatedPosition]) -> Vec<&'a CalculatedPosition> {
        let mut selected: Vec<&CalculatedPosition> =
            positions.iter().filter(|p| self.matches(p)).collect();

        selected.sort_by(|a, b| {
            let ordering = match self.sort_key {
                PositionSortKey::Symbol => a.symbol.cmp(&b.symbol),
                PositionSortKey::Invested => compare_f64(
                    a.total_invested.abs(),
                    b.total_invested.abs(),
                ),
                PositionSortKey::ProfitLoss => compare_f64(
                    a.profit_loss.unwrap_or(0.0),
                    b.profit_loss.unwrap_or(0.0),
                ),
                PositionSortKey::DividendYield => compare_f64(a.dividend_yield, b.dividend_yield),
            };
            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        selected
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
