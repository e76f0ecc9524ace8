//! Property-based tests for core types: frequency, parameters and rounding.

use proptest::prelude::*;

use invest_core::{round_f64, Frequency, SimulationParameters, TableContract};

// =============================================================================
// Generators
// =============================================================================

fn arb_frequency() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Monthly),
        Just(Frequency::Quarterly),
        Just(Frequency::SemiAnnually),
        Just(Frequency::Annually),
    ]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_frequency_string_round_trip(frequency in arb_frequency()) {
        let parsed: Frequency = frequency.as_str().parse().unwrap();
        prop_assert_eq!(parsed, frequency);
        prop_assert_eq!(frequency.periods_per_year() * frequency.months_per_period(), 12);
    }

    #[test]
    fn prop_total_periods(frequency in arb_frequency(), years in 1u32..=40) {
        let params = SimulationParameters::new(1_000.0).with_horizon(years, frequency);
        prop_assert!(params.validate().is_ok());
        prop_assert_eq!(params.total_periods(), frequency.periods_per_year() * years);
    }

    #[test]
    fn prop_stock_ratio_keeps_allocation_whole(stock in 0.0f64..=100.0) {
        let params = SimulationParameters::default().with_stock_ratio(stock);
        prop_assert!((params.stock_weight() + params.bond_weight() - 1.0).abs() < 1e-12);
        prop_assert!(params.validate().is_ok());
    }

    #[test]
    fn prop_rounding_is_idempotent_and_close(value in -1.0e6f64..1.0e6, dp in 0u32..=6) {
        let once = round_f64(value, dp);
        prop_assert_eq!(round_f64(once, dp), once);
        prop_assert!((once - value).abs() <= 0.5 * 10f64.powi(-(dp as i32)) + 1e-9);
    }

    #[test]
    fn prop_money_has_currency_scale(value in 0.0f64..1.0e9) {
        let money = TableContract::default().money(value);
        prop_assert!(money.scale() <= 2);
    }
}
