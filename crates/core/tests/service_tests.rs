// ═══════════════════════════════════════════════════════════════════
// Service Tests: corporate actions, position aggregation, valuation,
// ranking and position queries
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use portfolio_tracker_core::models::corporate_event::{CorporateAction, CorporateEvent};
use portfolio_tracker_core::models::position::{
    CalculatedPosition, PositionSortKey, SafetyMarginRating, SortDirection,
};
use portfolio_tracker_core::models::price::{AnnualDividend, PriceMap};
use portfolio_tracker_core::models::settings::Settings;
use portfolio_tracker_core::models::transaction::Transaction;
use portfolio_tracker_core::services::corporate_action_service::CorporateActionService;
use portfolio_tracker_core::services::position_service::PositionService;
use portfolio_tracker_core::services::ranking_service::{PositionQuery, RankingService};
use portfolio_tracker_core::services::valuation_service::{safety_margin, ValuationService};

const EPS: f64 = 1e-9;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn as_of() -> NaiveDate {
    d(2025, 6, 15)
}

fn no_prices() -> PriceMap {
    PriceMap::new()
}

fn prices(entries: &[(&str, f64)]) -> PriceMap {
    entries.iter().map(|(s, p)| (s.to_string(), *p)).collect()
}

fn split(symbol: &str, from: u32, to: u32, date: NaiveDate) -> CorporateEvent {
    CorporateEvent::new(
        symbol,
        symbol,
        CorporateAction::Split {
            ratio_from: from,
            ratio_to: to,
        },
        date,
    )
}

fn position(symbol: &str, invested: f64, shares: f64) -> CalculatedPosition {
    CalculatedPosition {
        symbol: symbol.into(),
        company_name: format!("{symbol} S.A."),
        total_shares: shares,
        average_price: 0.0,
        total_invested: invested,
        dividends_received_12m: 0.0,
        dividend_yield: 0.0,
        current_price: None,
        current_value: None,
        profit_loss: None,
        profit_loss_percent: None,
        fair_price: None,
        safety_margin: None,
        transactions: Vec::new(),
        corporate_events: Vec::new(),
        is_sold_out: shares <= 0.0,
    }
}

fn aggregate(transactions: &[Transaction], events: &[CorporateEvent]) -> Vec<CalculatedPosition> {
    PositionService::new().aggregate(transactions, &no_prices(), &no_prices(), events, as_of())
}

// ═══════════════════════════════════════════════════════════════════
// Corporate action adjustments
// ═══════════════════════════════════════════════════════════════════

mod adjustments {
    use super::*;

    #[test]
    fn split_one_to_two_doubles_shares() {
        let svc = CorporateActionService::new();
        let adj = svc.compute_adjustment(&split("WEGE3", 1, 2, as_of()), 100.0);
        assert_eq!(adj.old_quantity, 100.0);
        assert_eq!(adj.new_quantity, 200.0);
        assert!((adj.price_adjustment_factor - 0.5).abs() < EPS);
        assert_eq!(adj.cash_received, None);
        assert_eq!(adj.new_symbol_quantity, None);
    }

    #[test]
    fn split_drops_fractional_shares() {
        let svc = CorporateActionService::new();
        let adj = svc.compute_adjustment(&split("WEGE3", 2, 3, as_of()), 5.0);
        assert_eq!(adj.new_quantity, 7.0);
    }

    #[test]
    fn reverse_split_groups_ratio_from_into_ratio_to() {
        let svc = CorporateActionService::new();
        let event = CorporateEvent::new(
            "MGLU3",
            "Magazine Luiza",
            CorporateAction::ReverseSplit {
                ratio_from: 10,
                ratio_to: 1,
            },
            as_of(),
        );
        let adj = svc.compute_adjustment(&event, 105.0);
        assert_eq!(adj.new_quantity, 10.0);
        assert!((adj.price_adjustment_factor - 10.0).abs() < EPS);
    }

    #[test]
    fn reverse_split_entered_like_a_split_increases_shares() {
        // ratio_from=1, ratio_to=2 always means "1 becomes 2", whatever the kind.
        let svc = CorporateActionService::new();
        let event = CorporateEvent::new(
            "MGLU3",
            "Magazine Luiza",
            CorporateAction::ReverseSplit {
                ratio_from: 1,
                ratio_to: 2,
            },
            as_of(),
        );
        assert_eq!(svc.compute_adjustment(&event, 100.0).new_quantity, 200.0);
    }

    #[test]
    fn bonus_adds_floored_shares() {
        let svc = CorporateActionService::new();
        let event = CorporateEvent::new(
            "ITSA4",
            "Itausa",
            CorporateAction::Bonus {
                bonus_shares_per_old: 0.1,
            },
            as_of(),
        );
        let adj = svc.compute_adjustment(&event, 100.0);
        assert_eq!(adj.new_quantity, 110.0);
        assert!((adj.price_adjustment_factor - 100.0 / 110.0).abs() < EPS);

        let odd = svc.compute_adjustment(&event, 15.0);
        assert_eq!(odd.new_quantity, 16.0);
    }

    #[test]
    fn bonus_on_empty_holding_keeps_factor_one() {
        let svc = CorporateActionService::new();
        let event = CorporateEvent::new(
            "ITSA4",
            "Itausa",
            CorporateAction::Bonus {
                bonus_shares_per_old: 0.1,
            },
            as_of(),
        );
        let adj = svc.compute_adjustment(&event, 0.0);
        assert_eq!(adj.new_quantity, 0.0);
        assert_eq!(adj.price_adjustment_factor, 1.0);
    }

    #[test]
    fn merger_converts_whole_position() {
        let svc = CorporateActionService::new();
        let event = CorporateEvent::new(
            "OIBR3",
            "Oi",
            CorporateAction::Merger {
                new_symbol: "TIMS3".into(),
                new_company_name: "TIM".into(),
                cash_per_share: 1.5,
                new_shares_per_old: 0.75,
            },
            as_of(),
        );
        let adj = svc.compute_adjustment(&event, 101.0);
        assert_eq!(adj.new_quantity, 0.0);
        assert_eq!(adj.new_symbol_quantity, Some(75.0));
        assert!((adj.cash_received.unwrap() - 151.5).abs() < EPS);
    }

    #[test]
    fn spinoff_keeps_original_shares() {
        let svc = CorporateActionService::new();
        let event = CorporateEvent::new(
            "GGBR4",
            "Gerdau",
            CorporateAction::Spinoff {
                new_symbol: "GOAU4".into(),
                new_company_name: "Metalurgica Gerdau".into(),
                new_shares_per_old: 0.5,
            },
            as_of(),
        );
        let adj = svc.compute_adjustment(&event, 51.0);
        assert_eq!(adj.new_quantity, 51.0);
        assert_eq!(adj.new_symbol_quantity, Some(25.0));
        assert_eq!(adj.price_adjustment_factor, 1.0);
    }

    #[test]
    fn zero_ratio_from_old_data_is_a_no_op() {
        let svc = CorporateActionService::new();
        let adj = svc.compute_adjustment(&split("WEGE3", 0, 2, as_of()), 100.0);
        assert_eq!(adj.new_quantity, 100.0);
        assert_eq!(adj.price_adjustment_factor, 1.0);
    }

    #[test]
    fn only_processed_events_are_applied_in_order() {
        let svc = CorporateActionService::new();
        let events = vec![
            split("WEGE3", 1, 2, d(2024, 1, 1)).processed(),
            split("WEGE3", 1, 3, d(2024, 2, 1)),
            split("WEGE3", 1, 5, d(2024, 3, 1)).processed(),
        ];
        assert_eq!(svc.apply_processed(&events, 10.0), 100.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Position aggregation
// ═══════════════════════════════════════════════════════════════════

mod aggregation {
    use super::*;

    #[test]
    fn buys_accumulate_shares_and_cost() {
        let txs = vec![
            Transaction::buy("ITSA4", "Itausa", 100.0, 10.0, d(2024, 1, 10)),
            Transaction::buy("ITSA4", "Itausa", 50.0, 13.0, d(2024, 2, 10)),
        ];
        let positions = aggregate(&txs, &[]);
        assert_eq!(positions.len(), 1);
        let p = &positions[0];
        assert_eq!(p.total_shares, 150.0);
        assert_eq!(p.total_invested, 1650.0);
        assert!((p.average_price - 11.0).abs() < EPS);
        assert!(!p.is_sold_out);
    }

    #[test]
    fn sell_keeps_average_price() {
        let txs = vec![
            Transaction::buy("BBAS3", "Banco do Brasil", 100.0, 20.0, d(2024, 1, 10)),
            Transaction::buy("BBAS3", "Banco do Brasil", 100.0, 30.0, d(2024, 2, 10)),
            Transaction::sell("BBAS3", "Banco do Brasil", 50.0, 40.0, d(2024, 3, 10)),
        ];
        let p = &aggregate(&txs, &[])[0];
        assert_eq!(p.total_shares, 150.0);
        assert!((p.total_invested - 3750.0).abs() < EPS);
        assert!((p.average_price - 25.0).abs() < EPS);
    }

    #[test]
    fn selling_everything_marks_sold_out() {
        let txs = vec![
            Transaction::buy("PETR4", "Petrobras", 10.0, 30.0, d(2024, 1, 10)),
            Transaction::sell("PETR4", "Petrobras", 10.0, 35.0, d(2024, 2, 10)),
        ];
        let p = &aggregate(&txs, &[])[0];
        assert_eq!(p.total_shares, 0.0);
        assert!(p.is_sold_out);
        assert_eq!(p.average_price, 0.0);
        assert_eq!(p.dividend_yield, 0.0);
    }

    #[test]
    fn company_name_comes_from_first_transaction() {
        let txs = vec![
            Transaction::buy("VALE3", "Vale", 1.0, 60.0, d(2024, 1, 10)),
            Transaction::buy("VALE3", "Vale S.A.", 1.0, 60.0, d(2024, 2, 10)),
        ];
        assert_eq!(aggregate(&txs, &[])[0].company_name, "Vale");
    }

    #[test]
    fn dividend_window_includes_exactly_one_year_back() {
        let txs = vec![
            Transaction::buy("TAEE11", "Taesa", 100.0, 10.0, d(2023, 1, 10)),
            Transaction::dividend("TAEE11", "Taesa", 50.0, d(2024, 6, 15)),
            Transaction::dividend("TAEE11", "Taesa", 70.0, d(2024, 6, 14)),
            Transaction::dividend("TAEE11", "Taesa", 30.0, d(2025, 6, 15)),
        ];
        let p = &aggregate(&txs, &[])[0];
        assert_eq!(p.dividends_received_12m, 80.0);
        assert!((p.dividend_yield - 8.0).abs() < EPS);
        // Old dividends are still part of the history.
        assert_eq!(p.transactions.len(), 4);
    }

    #[test]
    fn dividends_after_as_of_are_outside_the_window() {
        let txs = vec![
            Transaction::buy("TAEE11", "Taesa", 100.0, 10.0, d(2023, 1, 10)),
            Transaction::dividend("TAEE11", "Taesa", 40.0, d(2025, 6, 15)),
            Transaction::dividend("TAEE11", "Taesa", 90.0, d(2025, 6, 16)),
        ];
        let p = &aggregate(&txs, &[])[0];
        assert_eq!(p.dividends_received_12m, 40.0);
        assert_eq!(p.transactions.len(), 3);
    }

    #[test]
    fn dividends_do_not_change_shares_or_cost() {
        let txs = vec![
            Transaction::buy("TAEE11", "Taesa", 100.0, 10.0, d(2025, 1, 10)),
            Transaction::dividend("TAEE11", "Taesa", 25.0, d(2025, 3, 1)),
        ];
        let p = &aggregate(&txs, &[])[0];
        assert_eq!(p.total_shares, 100.0);
        assert_eq!(p.total_invested, 1000.0);
    }

    #[test]
    fn dividend_only_symbol_has_zero_yield() {
        let txs = vec![Transaction::dividend("KLBN11", "Klabin", 12.0, d(2025, 3, 1))];
        let p = &aggregate(&txs, &[])[0];
        assert_eq!(p.dividends_received_12m, 12.0);
        assert_eq!(p.dividend_yield, 0.0);
        assert_eq!(p.average_price, 0.0);
        assert!(p.is_sold_out);
    }

    #[test]
    fn near_zero_cost_basis_yields_zero() {
        let txs = vec![
            Transaction::buy("X", "X", 1.0, 0.005, d(2025, 1, 1)),
            Transaction::dividend("X", "X", 1.0, d(2025, 2, 1)),
        ];
        let p = &aggregate(&txs, &[])[0];
        assert_eq!(p.average_price, 0.0);
        assert_eq!(p.dividend_yield, 0.0);
        assert!(p.average_price.is_finite());
    }

    #[test]
    fn transactions_are_listed_most_recent_first() {
        let txs = vec![
            Transaction::buy("ITSA4", "Itausa", 1.0, 10.0, d(2024, 3, 1)),
            Transaction::buy("ITSA4", "Itausa", 1.0, 10.0, d(2024, 1, 1)),
            Transaction::buy("ITSA4", "Itausa", 1.0, 10.0, d(2024, 5, 1)),
        ];
        let p = &aggregate(&txs, &[])[0];
        let dates: Vec<NaiveDate> = p.transactions.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![d(2024, 5, 1), d(2024, 3, 1), d(2024, 1, 1)]);
    }

    #[test]
    fn processed_split_adjusts_shares_but_not_cost() {
        let txs = vec![Transaction::buy("WEGE3", "WEG", 100.0, 40.0, d(2024, 1, 10))];
        let events = vec![split("WEGE3", 1, 2, d(2024, 4, 1)).processed()];
        let p = &aggregate(&txs, &events)[0];
        assert_eq!(p.total_shares, 200.0);
        assert_eq!(p.total_invested, 4000.0);
        assert!((p.average_price - 20.0).abs() < EPS);
        assert_eq!(p.corporate_events.len(), 1);
    }

    #[test]
    fn unprocessed_event_is_attached_but_ignored() {
        let txs = vec![Transaction::buy("WEGE3", "WEG", 100.0, 40.0, d(2024, 1, 10))];
        let events = vec![split("WEGE3", 1, 2, d(2024, 4, 1))];
        let p = &aggregate(&txs, &events)[0];
        assert_eq!(p.total_shares, 100.0);
        assert_eq!(p.corporate_events.len(), 1);
    }

    #[test]
    fn events_are_applied_by_date_not_input_order() {
        let txs = vec![Transaction::buy("WEGE3", "WEG", 5.0, 40.0, d(2024, 1, 10))];
        let events = vec![
            split("WEGE3", 1, 2, d(2024, 6, 1)).processed(),
            CorporateEvent::new(
                "WEGE3",
                "WEG",
                CorporateAction::ReverseSplit {
                    ratio_from: 3,
                    ratio_to: 1,
                },
                d(2024, 3, 1),
            )
            .processed(),
        ];
        // By date: 5 -> 1 -> 2. Input order would give 5 -> 10 -> 3.
        let p = &aggregate(&txs, &events)[0];
        assert_eq!(p.total_shares, 2.0);
        let dates: Vec<NaiveDate> = p.corporate_events.iter().map(|e| e.event_date).collect();
        assert_eq!(dates, vec![d(2024, 3, 1), d(2024, 6, 1)]);
    }

    #[test]
    fn merger_zeroes_shares_and_keeps_cost_basis() {
        let txs = vec![Transaction::buy("OIBR3", "Oi", 100.0, 10.0, d(2024, 1, 10))];
        let events = vec![CorporateEvent::new(
            "OIBR3",
            "Oi",
            CorporateAction::Merger {
                new_symbol: "TIMS3".into(),
                new_company_name: "TIM".into(),
                cash_per_share: 0.0,
                new_shares_per_old: 0.5,
            },
            d(2024, 5, 1),
        )
        .processed()];
        let positions = aggregate(&txs, &events);
        assert_eq!(positions.len(), 1);
        let p = &positions[0];
        assert_eq!(p.total_shares, 0.0);
        assert_eq!(p.total_invested, 1000.0);
        assert!(p.is_sold_out);
    }

    #[test]
    fn events_for_unknown_symbols_are_dropped() {
        let txs = vec![Transaction::buy("WEGE3", "WEG", 100.0, 40.0, d(2024, 1, 10))];
        let events = vec![split("XPTO3", 1, 2, d(2024, 4, 1)).processed()];
        let positions = aggregate(&txs, &events);
        assert_eq!(positions.len(), 1);
        assert!(positions[0].corporate_events.is_empty());
    }

    #[test]
    fn prices_are_applied_by_symbol() {
        let txs = vec![Transaction::buy("ITSA4", "Itausa", 100.0, 10.0, d(2024, 1, 10))];
        let current = prices(&[("ITSA4", 12.0), ("UNKNOWN", 1.0)]);
        let fair = prices(&[("ITSA4", 15.0)]);
        let positions =
            PositionService::new().aggregate(&txs, &current, &fair, &[], as_of());
        let p = &positions[0];
        assert_eq!(p.current_price, Some(12.0));
        assert_eq!(p.current_value, Some(1200.0));
        assert_eq!(p.profit_loss, Some(200.0));
        assert!((p.profit_loss_percent.unwrap() - 20.0).abs() < EPS);
        assert!((p.safety_margin.unwrap() - 20.0).abs() < EPS);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let txs = vec![
            Transaction::buy("ITSA4", "Itausa", 100.0, 10.0, d(2024, 1, 10)),
            Transaction::dividend("ITSA4", "Itausa", 20.0, d(2025, 1, 10)),
            Transaction::buy("BBAS3", "Banco do Brasil", 10.0, 25.0, d(2024, 1, 10)),
        ];
        let events = vec![split("ITSA4", 1, 2, d(2024, 6, 1)).processed()];
        let current = prices(&[("ITSA4", 11.0)]);
        let svc = PositionService::new();
        let first = svc.aggregate(&txs, &current, &no_prices(), &events, as_of());
        let second = svc.aggregate(&txs, &current, &no_prices(), &events, as_of());
        assert_eq!(first, second);
    }

    #[test]
    fn active_view_drops_sold_out_positions() {
        let txs = vec![
            Transaction::buy("PETR4", "Petrobras", 10.0, 30.0, d(2024, 1, 10)),
            Transaction::sell("PETR4", "Petrobras", 10.0, 35.0, d(2024, 2, 10)),
            Transaction::buy("VALE3", "Vale", 5.0, 60.0, d(2024, 1, 10)),
        ];
        let active = PositionService::new().aggregate_active(
            &txs,
            &no_prices(),
            &no_prices(),
            &[],
            as_of(),
        );
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].symbol, "VALE3");
    }

    #[test]
    fn empty_input_gives_no_positions() {
        assert!(aggregate(&[], &[]).is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Valuation
// ═══════════════════════════════════════════════════════════════════

mod valuation {
    use super::*;

    #[test]
    fn fair_price_scenario_is_rated_excellent() {
        let svc = ValuationService::new();
        let history = vec![
            AnnualDividend::new(2022, "1.00"),
            AnnualDividend::new(2023, "1.20"),
            AnnualDividend::new(2024, "0.80"),
        ];
        let estimate = svc.estimate_fair_price(&history).unwrap();
        assert!((estimate.average_dividend - 1.0).abs() < EPS);
        assert!((estimate.fair_price - 16.666_666_666).abs() < 1e-6);
        assert_eq!(estimate.dividend_data.len(), 3);

        let margin = safety_margin(estimate.fair_price, 13.33).unwrap();
        assert!((margin - 20.0).abs() < 0.1);
        assert_eq!(svc.rate(margin), SafetyMarginRating::Excellent);
    }

    #[test]
    fn invalid_dividend_rows_are_skipped() {
        let svc = ValuationService::new();
        let history = vec![
            AnnualDividend::new(2022, "0.60"),
            AnnualDividend::new(2023, "n/a"),
            AnnualDividend::new(2024, "-1"),
        ];
        let estimate = svc.estimate_fair_price(&history).unwrap();
        assert!((estimate.fair_price - 10.0).abs() < EPS);
        assert_eq!(estimate.dividend_data.keys().copied().collect::<Vec<_>>(), vec![2022]);
    }

    #[test]
    fn no_valid_dividends_gives_no_estimate() {
        let svc = ValuationService::new();
        assert!(svc.estimate_fair_price(&[]).is_none());
        assert!(svc
            .estimate_fair_price(&[AnnualDividend::new(2024, "")])
            .is_none());
    }

    #[test]
    fn discount_rate_comes_from_settings() {
        let settings = Settings {
            discount_rate: 0.08,
            ..Settings::default()
        };
        let svc = ValuationService::with_settings(&settings);
        let estimate = svc
            .estimate_fair_price(&[AnnualDividend::new(2024, "2.00")])
            .unwrap();
        assert!((estimate.fair_price - 25.0).abs() < EPS);
    }

    #[test]
    fn decorate_values_an_active_position() {
        let svc = ValuationService::new();
        let p = svc.decorate(&position("ITSA4", 1000.0, 100.0), Some(8.0), Some(10.0));
        assert_eq!(p.current_value, Some(800.0));
        assert_eq!(p.profit_loss, Some(-200.0));
        assert!((p.profit_loss_percent.unwrap() + 20.0).abs() < EPS);
        assert!((p.safety_margin.unwrap() - 20.0).abs() < EPS);
        assert_eq!(p.safety_margin_rating(), Some(SafetyMarginRating::Excellent));
    }

    #[test]
    fn decorate_without_prices_leaves_fields_empty() {
        let svc = ValuationService::new();
        let p = svc.decorate(&position("ITSA4", 1000.0, 100.0), None, Some(10.0));
        assert_eq!(p.current_value, None);
        assert_eq!(p.profit_loss, None);
        assert_eq!(p.safety_margin, None);
        assert_eq!(p.fair_price, Some(10.0));
    }

    #[test]
    fn decorate_sold_out_position_skips_value() {
        let svc = ValuationService::new();
        let p = svc.decorate(&position("PETR4", 0.0, 0.0), Some(30.0), Some(40.0));
        assert_eq!(p.current_price, Some(30.0));
        assert_eq!(p.current_value, None);
        assert_eq!(p.profit_loss, None);
        assert!((p.safety_margin.unwrap() - 25.0).abs() < EPS);
    }

    #[test]
    fn zero_fair_price_has_no_margin() {
        let svc = ValuationService::new();
        let p = svc.decorate(&position("ITSA4", 1000.0, 100.0), Some(8.0), Some(0.0));
        assert_eq!(p.safety_margin, None);
    }

    #[test]
    fn non_positive_cost_basis_has_zero_percent() {
        let svc = ValuationService::new();
        let p = svc.decorate(&position("ITSA4", -50.0, 10.0), Some(10.0), None);
        assert_eq!(p.profit_loss, Some(150.0));
        assert_eq!(p.profit_loss_percent, Some(0.0));
    }

    #[test]
    fn reprice_previews_a_new_price() {
        let svc = ValuationService::new();
        let mut base = position("ITSA4", 1000.0, 100.0);
        base.fair_price = Some(12.5);
        let p = svc.reprice(&base, 10.0);
        assert_eq!(p.current_price, Some(10.0));
        assert_eq!(p.current_value, Some(1000.0));
        assert_eq!(p.profit_loss, Some(0.0));
        assert!((p.safety_margin.unwrap() - 20.0).abs() < EPS);
        // The original is untouched.
        assert_eq!(base.current_price, None);
    }

    #[test]
    fn reprice_sold_out_only_records_price() {
        let svc = ValuationService::new();
        let p = svc.reprice(&position("PETR4", 0.0, 0.0), 30.0);
        assert_eq!(p.current_price, Some(30.0));
        assert_eq!(p.current_value, None);
        assert_eq!(p.safety_margin, None);
    }

    #[test]
    fn custom_threshold_changes_rating() {
        let settings = Settings {
            excellent_margin_threshold: 30.0,
            ..Settings::default()
        };
        let svc = ValuationService::with_settings(&settings);
        assert_eq!(svc.rate(25.0), SafetyMarginRating::Low);
        assert_eq!(svc.rate(30.0), SafetyMarginRating::Excellent);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Ranking and queries
// ═══════════════════════════════════════════════════════════════════

mod ranking {
    use super::*;

    fn symbols(positions: &[CalculatedPosition]) -> Vec<&str> {
        positions.iter().map(|p| p.symbol.as_str()).collect()
    }

    #[test]
    fn active_first_then_largest_invested() {
        let mut positions = vec![
            position("A", 1000.0, 10.0),
            position("B", 500.0, 0.0),
            position("C", 2000.0, 10.0),
        ];
        RankingService::new().rank(&mut positions);
        assert_eq!(symbols(&positions), vec!["C", "A", "B"]);
    }

    #[test]
    fn ranking_uses_absolute_invested() {
        let mut positions = vec![position("A", 100.0, 1.0), position("B", -300.0, 1.0)];
        RankingService::new().rank(&mut positions);
        assert_eq!(symbols(&positions), vec!["B", "A"]);
    }

    #[test]
    fn active_only_keeps_ranked_order() {
        let positions = vec![
            position("C", 2000.0, 10.0),
            position("A", 1000.0, 10.0),
            position("B", 500.0, 0.0),
        ];
        let active = RankingService::new().active_only(positions);
        assert_eq!(symbols(&active), vec!["C", "A"]);
    }

    #[test]
    fn query_defaults_to_invested_descending() {
        let q = PositionQuery::new();
        assert_eq!(q.sort_key, PositionSortKey::Invested);
        assert_eq!(q.direction, SortDirection::Desc);
    }

    #[test]
    fn selecting_same_column_toggles_direction() {
        let mut q = PositionQuery::new();
        q.select_sort(PositionSortKey::Invested);
        assert_eq!(q.direction, SortDirection::Asc);
        q.select_sort(PositionSortKey::Invested);
        assert_eq!(q.direction, SortDirection::Desc);
        q.select_sort(PositionSortKey::Symbol);
        assert_eq!(q.sort_key, PositionSortKey::Symbol);
        assert_eq!(q.direction, SortDirection::Desc);
    }

    #[test]
    fn search_matches_symbol_or_company_case_insensitively() {
        let positions = vec![
            position("ITSA4", 100.0, 1.0),
            position("BBAS3", 200.0, 1.0),
        ];
        let q = PositionQuery::new().with_search("itsa");
        let found: Vec<&str> = q.apply(&positions).iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(found, vec!["ITSA4"]);

        let by_company = PositionQuery::new().with_search("bbas3 s.a.");
        assert_eq!(by_company.apply(&positions).len(), 1);

        assert_eq!(PositionQuery::new().apply(&positions).len(), 2);
    }

    #[test]
    fn sorts_by_symbol_ascending() {
        let positions = vec![
            position("VALE3", 100.0, 1.0),
            position("BBAS3", 200.0, 1.0),
            position("ITSA4", 300.0, 1.0),
        ];
        let mut q = PositionQuery::new();
        q.select_sort(PositionSortKey::Symbol);
        q.select_sort(PositionSortKey::Symbol);
        let sorted: Vec<&str> = q.apply(&positions).iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(sorted, vec!["BBAS3", "ITSA4", "VALE3"]);
    }

    #[test]
    fn missing_profit_counts_as_zero() {
        let mut winner = position("W", 100.0, 1.0);
        winner.profit_loss = Some(50.0);
        let mut loser = position("L", 100.0, 1.0);
        loser.profit_loss = Some(-50.0);
        let unknown = position("U", 100.0, 1.0);
        let positions = vec![loser, unknown, winner];

        let mut q = PositionQuery::new();
        q.select_sort(PositionSortKey::ProfitLoss);
        let sorted: Vec<&str> = q.apply(&positions).iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(sorted, vec!["W", "U", "L"]);
    }

    #[test]
    fn sorts_by_dividend_yield() {
        let mut high = position("H", 100.0, 1.0);
        high.dividend_yield = 9.0;
        let mut low = position("L", 100.0, 1.0);
        low.dividend_yield = 3.0;
        let positions = vec![low, high];

        let mut q = PositionQuery::new();
        q.select_sort(PositionSortKey::DividendYield);
        let sorted: Vec<&str> = q.apply(&positions).iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(sorted, vec!["H", "L"]);
    }
}
