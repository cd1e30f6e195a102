use serde::{Deserialize, Serialize};

use super::position::SafetyMarginRating;

/// Annual rate used to turn an average dividend into a fair price (6%).
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.06;

/// User-configurable settings, stored inside the portfolio snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Currency label shown next to amounts (e.g., "BRL"). No conversion is done.
    pub display_currency: String,

    /// Dividend-discount rate for fair price estimation.
    pub discount_rate: f64,

    /// Safety margin percentage rated as excellent.
    pub excellent_margin_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_currency: "BRL".to_string(),
            discount_rate: DEFAULT_DISCOUNT_RATE,
            excellent_margin_threshold: SafetyMarginRating::EXCELLENT_THRESHOLD,
        }
    }
}
