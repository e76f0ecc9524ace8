//! End-to-end tests for the strategy comparison pipeline.
//!
//! Each test drives the full flow:
//! 1. Build simulation parameters
//! 2. Convert them to period parameters
//! 3. Run the strategy engine on a market series
//! 4. Summarize and compare the resulting ledgers

use chrono::{Months, NaiveDate};
use rust_decimal_macros::dec;

use invest_analytics::{
    compare_strategies, convert_parameters, run_strategy, summarize, value_averaging_target,
    Metrics, ParameterConverter, StrategyEngine, SyntheticMarketGenerator,
};
use invest_core::{
    ComparisonConfig, EngineError, Frequency, MarketDataPoint, PrecisionConfig,
    SimulationParameters, StrategyKind, SyntheticMarketConfig, TableContract,
};

/// Flat market: constant risky price and constant yield.
fn flat_market(points: usize, frequency: Frequency) -> Vec<MarketDataPoint> {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    (0..points)
        .map(|i| {
            let date = start + Months::new(frequency.months_per_period() * i as u32);
            MarketDataPoint::from_yield(date, 250.0, 3.5)
        })
        .collect()
}

/// Market with an alternating up/down risky price path.
fn choppy_market(points: usize, frequency: Frequency) -> Vec<MarketDataPoint> {
    let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
    let mut price = 100.0;
    (0..points)
        .map(|i| {
            if i > 0 {
                price *= if i % 2 == 0 { 1.08 } else { 0.95 };
            }
            let date = start + Months::new(frequency.months_per_period() * i as u32);
            let yield_pct = 2.0 + (i % 3) as f64 * 0.25;
            MarketDataPoint::from_yield(date, price, yield_pct)
        })
        .collect()
}

fn quarterly_params() -> SimulationParameters {
    SimulationParameters::new(10_000.0)
        .with_horizon(5, Frequency::Quarterly)
        .with_rates(8.0, 2.0)
        .with_risk_free_rate(2.0)
}

#[test]
fn test_total_periods_for_every_frequency() {
    for frequency in Frequency::ALL {
        for years in [1, 7, 40] {
            let period = convert_parameters(years, frequency, 8.0, 2.0, 18.0, 5.0).unwrap();
            assert_eq!(period.total_periods, frequency.periods_per_year() * years);
        }
    }
}

#[test]
fn test_flat_market_va_rebalance_reaches_target() {
    let params = quarterly_params().with_annual_investment(4_000.0);
    let period = ParameterConverter::convert_parameters(&params).unwrap();
    let market = flat_market(period.required_market_points(), params.frequency);

    let ledger = run_strategy(StrategyKind::VaRebalance, &params, &period, &market).unwrap();

    let expected = value_averaging_target(
        params.initial_investment,
        period.period_contribution,
        period.period_growth_rate,
        period.period_inflation_rate,
        period.total_periods,
    );
    assert!((ledger.final_value() - expected).abs() < 1e-6);
    for row in ledger.rows() {
        let target = row.target_value.unwrap();
        assert!((row.portfolio_value - target).abs() < 1e-6);
    }
}

#[test]
fn test_flat_market_dca_value_equals_invested() {
    let params = quarterly_params();
    let period = ParameterConverter::convert_parameters(&params).unwrap();
    let market = flat_market(period.required_market_points(), params.frequency);

    let ledger = run_strategy(StrategyKind::Dca, &params, &period, &market).unwrap();

    assert!((ledger.final_value() - ledger.total_invested()).abs() < 1e-6);
    assert!(ledger.rows().iter().all(|r| r.period_return.abs() < 1e-12));
}

#[test]
fn test_dca_without_inflation_invests_base_times_periods() {
    let params = quarterly_params().with_inflation_adjusted(false);
    let period = ParameterConverter::convert_parameters(&params).unwrap();
    let market = choppy_market(period.required_market_points(), params.frequency);

    let ledger = run_strategy(StrategyKind::Dca, &params, &period, &market).unwrap();

    let expected = params.initial_investment * f64::from(period.total_periods + 1);
    assert!((ledger.total_invested() - expected).abs() < 1e-6);
    assert!(ledger.rows().iter().all(|r| r.cash_flow >= 0.0));
}

#[test]
fn test_va_nosell_contributions_never_negative() {
    let params = quarterly_params().with_rates(-5.0, 2.0);
    let period = ParameterConverter::convert_parameters(&params).unwrap();
    let market = choppy_market(period.required_market_points(), params.frequency);

    let no_sell = run_strategy(StrategyKind::VaNoSell, &params, &period, &market).unwrap();
    assert!(no_sell.rows().iter().all(|r| r.cash_flow >= 0.0));
    assert!(no_sell.rows().iter().all(|r| r.cumulative_withdrawn == 0.0));

    // 목표가 하락하므로 Rebalance는 인출이 발생함
    let rebalance = run_strategy(StrategyKind::VaRebalance, &params, &period, &market).unwrap();
    assert!(rebalance.rows().iter().any(|r| r.cash_flow < 0.0));

    // 인출이 있어도 누적 투입금은 줄지 않음
    let invested: Vec<f64> = rebalance
        .rows()
        .iter()
        .map(|r| r.cumulative_invested)
        .collect();
    assert!(invested.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn test_missing_market_data_is_fatal() {
    let params = quarterly_params();
    let period = ParameterConverter::convert_parameters(&params).unwrap();
    let market = flat_market(period.total_periods as usize, params.frequency);

    for kind in StrategyKind::ALL {
        let err = run_strategy(kind, &params, &period, &market).unwrap_err();
        assert!(err.is_data_error());
        assert!(matches!(
            err,
            EngineError::MissingMarketData {
                required: 21,
                available: 20
            }
        ));
    }
}

#[test]
fn test_invalid_parameters_fail_fast() {
    let mut params = quarterly_params();
    params.stock_ratio = 55.0;
    params.bond_ratio = 55.0;

    let err = ParameterConverter::convert_parameters(&params).unwrap_err();
    assert!(err.is_validation());

    let params = quarterly_params().with_horizon(45, Frequency::Monthly);
    assert!(ParameterConverter::convert_parameters(&params).is_err());
}

#[test]
fn test_metric_reference_values() {
    let metrics = Metrics::default();

    assert!((metrics.irr(&[-1000.0, 1100.0], None) - 0.10).abs() < 1e-4);
    assert_eq!(metrics.max_drawdown(&[1.0, 2.0, 3.0, 4.0, 5.0]), 0.0);
    assert_eq!(metrics.sharpe_ratio(&[0.02; 8], 0.02), 0.0);
}

#[test]
fn test_summarize_two_ledgers() {
    let params = quarterly_params();
    let period = ParameterConverter::convert_parameters(&params).unwrap();
    let market = choppy_market(period.required_market_points(), params.frequency);
    let engine = StrategyEngine::new(params.clone(), period).unwrap();

    let va = engine.run(StrategyKind::VaRebalance, &market).unwrap();
    let dca = engine.run(StrategyKind::Dca, &market).unwrap();

    let (first, second, comparison) = summarize(&va, &dca, 0.02, period.periods_per_year)
        .unwrap()
        .into_parts();

    assert_eq!(first.strategy, StrategyKind::VaRebalance);
    assert_eq!(second.strategy, StrategyKind::Dca);
    assert_eq!(comparison.first, StrategyKind::VaRebalance);
    assert_eq!(
        comparison.final_value_gap,
        first.final_value - second.final_value
    );
    assert!(first.max_drawdown <= 0.0);
    assert!(second.max_drawdown <= 0.0);
    assert!(first.volatility >= 0.0);

    // 반올림 계약: 비율 3자리, 수익률 4자리
    let contract = TableContract::default();
    assert_eq!(contract.round_summary(&first), first);
    assert_eq!(first.final_value.scale().min(2), first.final_value.scale());
}

#[test]
fn test_compare_strategies_on_synthetic_market() {
    let params = SimulationParameters::new(10_000.0)
        .with_horizon(10, Frequency::Monthly)
        .with_annual_investment(12_000.0);
    let period = ParameterConverter::convert_parameters(&params).unwrap();
    let market = SyntheticMarketGenerator::new(SyntheticMarketConfig::default())
        .generate(&period)
        .unwrap();

    let report = compare_strategies(
        &params,
        &market,
        PrecisionConfig::default(),
        &ComparisonConfig::default(),
    )
    .unwrap();

    assert_eq!(report.ledgers.len(), 3);
    for ledger in &report.ledgers {
        assert_eq!(ledger.len(), 121);
        assert!(TableContract::default().validate_ledger(ledger).is_ok());
    }
    assert_eq!(report.comparisons.len(), 2);
    assert!(report
        .comparisons
        .iter()
        .all(|c| c.second == StrategyKind::Dca && c.first.is_value_averaging()));

    let dca = report.summary(StrategyKind::Dca).unwrap();
    assert!(dca.total_invested > dec!(0));
}
