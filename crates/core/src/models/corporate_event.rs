use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calendar::{parse_calendar_date, DATE_FORMAT};
use super::transaction::normalize_symbol;
use crate::errors::CoreError;

/// Discriminant of a corporate action, as picked in the event form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorporateEventType {
    Split,
    ReverseSplit,
    Bonus,
    Merger,
    Spinoff,
}

impl std::fmt::Display for CorporateEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorporateEventType::Split => write!(f, "split"),
            CorporateEventType::ReverseSplit => write!(f, "reverse_split"),
            CorporateEventType::Bonus => write!(f, "bonus"),
            CorporateEventType::Merger => write!(f, "merger"),
            CorporateEventType::Spinoff => write!(f, "spinoff"),
        }
    }
}

/// The structural change itself, with exactly the fields its kind needs.
///
/// Splits and reverse splits share one convention: `ratio_from` old shares
/// become `ratio_to` new shares. A 1:2 split doubles a holding, a 10:1
/// reverse split divides it by ten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorporateAction {
    Split {
        ratio_from: u32,
        ratio_to: u32,
    },
    ReverseSplit {
        ratio_from: u32,
        ratio_to: u32,
    },
    /// Free shares granted per share held (0.1 = one new share per ten held)
    Bonus { bonus_shares_per_old: f64 },
    /// The holding is converted into `new_symbol` shares and/or cash.
    Merger {
        new_symbol: String,
        new_company_name: String,
        cash_per_share: f64,
        new_shares_per_old: f64,
    },
    /// The holding is kept and `new_symbol` shares are received on top.
    Spinoff {
        new_symbol: String,
        new_company_name: String,
        new_shares_per_old: f64,
    },
}

impl CorporateAction {
    pub fn event_type(&self) -> CorporateEventType {
        match self {
            CorporateAction::Split { .. } => CorporateEventType::Split,
            CorporateAction::ReverseSplit { .. } => CorporateEventType::ReverseSplit,
            CorporateAction::Bonus { .. } => CorporateEventType::Bonus,
            CorporateAction::Merger { .. } => CorporateEventType::Merger,
            CorporateAction::Spinoff { .. } => CorporateEventType::Spinoff,
        }
    }
}

/// A corporate action recorded against one symbol.
///
/// Created unprocessed; only events flagged `processed` change positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporateEvent {
    pub id: Uuid,
    pub symbol: String,
    pub company_name: String,
    pub action: CorporateAction,
    pub event_date: NaiveDate,
    pub processed: bool,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CorporateEvent {
    /// Build an unprocessed event with the canonical description.
    pub fn new(
        symbol: impl Into<String>,
        company_name: impl Into<String>,
        action: CorporateAction,
        event_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        let mut event = Self {
            id: Uuid::new_v4(),
            symbol: normalize_symbol(&symbol.into()),
            company_name: company_name.into().trim().to_string(),
            action,
            event_date,
            processed: false,
            description: String::new(),
            created_at: now,
            updated_at: now,
        };
        event.description = event.describe();
        event
    }

    /// Same event, already flagged processed.
    pub fn processed(mut self) -> Self {
        self.processed = true;
        self
    }

    pub fn event_type(&self) -> CorporateEventType {
        self.action.event_type()
    }

    /// Canonical human-readable sentence for this event, used when the
    /// user leaves the description blank.
    pub fn describe(&self) -> String {
        match &self.action {
            CorporateAction::Split {
                ratio_from,
                ratio_to,
            } => format!(
                "Split {ratio_from}:{ratio_to} — each {ratio_from} share becomes {ratio_to} shares"
            ),
            CorporateAction::ReverseSplit {
                ratio_from,
                ratio_to,
            } => format!(
                "Reverse split {ratio_from}:{ratio_to} — every {ratio_from} shares become {ratio_to} share"
            ),
            CorporateAction::Bonus {
                bonus_shares_per_old,
            } => format!("Bonus of {bonus_shares_per_old} shares for each share held"),
            CorporateAction::Merger {
                new_symbol,
                cash_per_share,
                new_shares_per_old,
                ..
            } => format!(
                "Merger: receives {new_shares_per_old} shares of {new_symbol} + {cash_per_share} in cash per share"
            ),
            CorporateAction::Spinoff {
                new_symbol,
                new_shares_per_old,
                ..
            } => format!(
                "Spin-off: receives {new_shares_per_old} shares of {new_symbol} for each share of {}",
                self.symbol
            ),
        }
    }

    /// Re-validate a typed event through its form representation.
    pub fn validate(&self) -> Vec<String> {
        CorporateEventDraft::from(self).validate()
    }
}

/// Result of applying one corporate event to a share count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAdjustment {
    pub old_quantity: f64,
    pub new_quantity: f64,
    /// Multiplier for the per-share cost (1.0 when the event leaves it alone)
    pub price_adjustment_factor: f64,
    pub cash_received: Option<f64>,
    /// Shares of the merged-into or spun-off symbol
    pub new_symbol_quantity: Option<f64>,
}

impl EventAdjustment {
    /// An adjustment that changes nothing.
    pub fn unchanged(quantity: f64) -> Self {
        Self {
            old_quantity: quantity,
            new_quantity: quantity,
            price_adjustment_factor: 1.0,
            cash_received: None,
            new_symbol_quantity: None,
        }
    }
}

/// Corporate event form input: every kind-specific field is optional here
/// and checked by [`CorporateEventDraft::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorporateEventDraft {
    pub symbol: String,
    pub company_name: String,
    pub event_type: Option<CorporateEventType>,
    /// `YYYY-MM-DD`
    pub event_date: String,
    pub ratio_from: Option<i64>,
    pub ratio_to: Option<i64>,
    pub bonus_shares_per_old: Option<f64>,
    pub new_symbol: Option<String>,
    pub new_company_name: Option<String>,
    pub cash_per_share: Option<f64>,
    pub new_shares_per_old: Option<f64>,
    pub description: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn is_positive(value: Option<f64>) -> bool {
    value.is_some_and(|v| v.is_finite() && v > 0.0)
}

impl CorporateEventDraft {
    /// Check universal fields, then the fields required by the event kind.
    /// Returns an empty list when the draft is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.symbol.trim().is_empty() {
            errors.push("Symbol is required".to_string());
        }
        if self.company_name.trim().is_empty() {
            errors.push("Company name is required".to_string());
        }
        if self.event_type.is_none() {
            errors.push("Event type is required".to_string());
        }
        if self.event_date.trim().is_empty() {
            errors.push("Event date is required".to_string());
        } else if parse_calendar_date(&self.event_date).is_none() {
            errors.push(format!("Invalid event date '{}': use YYYY-MM-DD", self.event_date));
        }

        match self.event_type {
            Some(CorporateEventType::Split) | Some(CorporateEventType::ReverseSplit) => {
                let from = self.ratio_from.unwrap_or(0);
                let to = self.ratio_to.unwrap_or(0);
                if from == 0 || to == 0 {
                    errors.push(
                        "Ratio (from:to) is required for splits and reverse splits".to_string(),
                    );
                }
                if from < 0 {
                    errors.push("Ratio \"from\" must be greater than zero".to_string());
                }
                if to < 0 {
                    errors.push("Ratio \"to\" must be greater than zero".to_string());
                }
                if from > i64::from(u32::MAX) || to > i64::from(u32::MAX) {
                    errors.push("Ratio is too large".to_string());
                }
            }
            Some(CorporateEventType::Bonus) => {
                if !is_positive(self.bonus_shares_per_old) {
                    errors.push(
                        "Bonus shares per share held must be greater than zero".to_string(),
                    );
                }
            }
            Some(CorporateEventType::Merger) => {
                if is_blank(&self.new_symbol) {
                    errors.push("New symbol is required for mergers".to_string());
                }
                if is_blank(&self.new_company_name) {
                    errors.push("New company name is required".to_string());
                }
                if !is_positive(self.new_shares_per_old) && !is_positive(self.cash_per_share) {
                    errors.push("Must specify shares received or cash per share".to_string());
                }
                if self.cash_per_share.is_some_and(|c| c < 0.0) {
                    errors.push("Cash per share cannot be negative".to_string());
                }
                if self.new_shares_per_old.is_some_and(|n| n < 0.0) {
                    errors.push("New shares per share held cannot be negative".to_string());
                }
            }
            Some(CorporateEventType::Spinoff) => {
                if is_blank(&self.new_symbol) {
                    errors.push("Spun-off company symbol is required".to_string());
                }
                if is_blank(&self.new_company_name) {
                    errors.push("New company name is required".to_string());
                }
                if !is_positive(self.new_shares_per_old) {
                    errors.push(
                        "Spun-off shares per share held must be greater than zero".to_string(),
                    );
                }
            }
            None => {}
        }

        errors
    }

    /// Validate and build the typed, unprocessed event.
    /// A blank description is replaced by [`CorporateEvent::describe`].
    pub fn into_event(self) -> Result<CorporateEvent, CoreError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(CoreError::from_messages(&errors));
        }

        let (Some(event_type), Some(event_date)) =
            (self.event_type, parse_calendar_date(&self.event_date))
        else {
            return Err(CoreError::ValidationError(
                "Event type and date are required".into(),
            ));
        };

        let ratio = |value: Option<i64>| u32::try_from(value.unwrap_or(0)).unwrap_or(0);
        let text = |value: Option<String>| value.unwrap_or_default().trim().to_string();

        let action = match event_type {
            CorporateEventType::Split => CorporateAction::Split {
                ratio_from: ratio(self.ratio_from),
                ratio_to: ratio(self.ratio_to),
            },
            CorporateEventType::ReverseSplit => CorporateAction::ReverseSplit {
                ratio_from: ratio(self.ratio_from),
                ratio_to: ratio(self.ratio_to),
            },
            CorporateEventType::Bonus => CorporateAction::Bonus {
                bonus_shares_per_old: self.bonus_shares_per_old.unwrap_or(0.0),
            },
            CorporateEventType::Merger => CorporateAction::Merger {
                new_symbol: normalize_symbol(&text(self.new_symbol)),
                new_company_name: text(self.new_company_name),
                cash_per_share: self.cash_per_share.unwrap_or(0.0),
                new_shares_per_old: self.new_shares_per_old.unwrap_or(0.0),
            },
            CorporateEventType::Spinoff => CorporateAction::Spinoff {
                new_symbol: normalize_symbol(&text(self.new_symbol)),
                new_company_name: text(self.new_company_name),
                new_shares_per_old: self.new_shares_per_old.unwrap_or(0.0),
            },
        };

        let mut event = CorporateEvent::new(self.symbol, self.company_name, action, event_date);
        if let Some(description) = self.description.filter(|d| !d.trim().is_empty()) {
            event.description = description.trim().to_string();
        }
        Ok(event)
    }
}

impl From<&CorporateEvent> for CorporateEventDraft {
    fn from(event: &CorporateEvent) -> Self {
        let mut draft = Self {
            symbol: event.symbol.clone(),
            company_name: event.company_name.clone(),
            event_type: Some(event.event_type()),
            event_date: event.event_date.format(DATE_FORMAT).to_string(),
            description: Some(event.description.clone()),
            ..Self::default()
        };
        match &event.action {
            CorporateAction::Split {
                ratio_from,
                ratio_to,
            }
            | CorporateAction::ReverseSplit {
                ratio_from,
                ratio_to,
            } => {
                draft.ratio_from = Some(i64::from(*ratio_from));
                draft.ratio_to = Some(i64::from(*ratio_to));
            }
            CorporateAction::Bonus {
                bonus_shares_per_old,
            } => draft.bonus_shares_per_old = Some(*bonus_shares_per_old),
            CorporateAction::Merger {
                new_symbol,
                new_company_name,
                cash_per_share,
                new_shares_per_old,
            } => {
                draft.new_symbol = Some(new_symbol.clone());
                draft.new_company_name = Some(new_company_name.clone());
                draft.cash_per_share = Some(*cash_per_share);
                draft.new_shares_per_old = Some(*new_shares_per_old);
            }
            CorporateAction::Spinoff {
                new_symbol,
                new_company_name,
                new_shares_per_old,
            } => {
                draft.new_symbol = Some(new_symbol.clone());
                draft.new_company_name = Some(new_company_name.clone());
                draft.new_shares_per_old = Some(*new_shares_per_old);
            }
        }
        draft
    }
}
