//! 전략 요약 및 비교.
//!
//! 완성된 원장에서 [`SummaryRow`]를 만들고 두 전략을 비교합니다.
//!
//! - 가치 시계열 → 최대 낙폭
//! - 기간 1부터의 수익률 → 변동성, 샤프, 소르티노, TWR
//! - 투자자 현금흐름 (매 기간 −투입금, 마지막에 +최종 가치) → IRR

use invest_core::{
    Comparison, ComparisonConfig, DecimalExt, EngineError, EngineResult, MarketDataPoint,
    PrecisionConfig, SimulationParameters, StrategyKind, StrategyLedger, SummaryReport, SummaryRow,
    TableContract, Verdict,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conversion::ParameterConverter;
use crate::engine::StrategyEngine;
use crate::metrics::Metrics;

/// 요약 집계기.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryAggregator {
    metrics: Metrics,
    contract: TableContract,
    tie_threshold: f64,
}

impl Default for SummaryAggregator {
    fn default() -> Self {
        Self::new(PrecisionConfig::default(), &ComparisonConfig::default())
    }
}

impl SummaryAggregator {
    /// 자릿수 설정과 비교 설정으로 집계기를 생성합니다.
    pub fn new(precision: PrecisionConfig, comparison: &ComparisonConfig) -> Self {
        Self {
            metrics: Metrics::new(precision),
            contract: TableContract::new(precision),
            tie_threshold: comparison.tie_threshold,
        }
    }

    /// 우열 판정 임계값 (연환산 수익률 차이, 소수)
    pub fn tie_threshold(&self) -> f64 {
        self.tie_threshold
    }

    /// 원장 하나의 요약 행을 계산합니다.
    ///
    /// `risk_free_rate`는 소수 단위입니다 (0.02 = 2%).
    pub fn summarize_ledger(&self, ledger: &StrategyLedger, risk_free_rate: f64) -> SummaryRow {
        let metrics = &self.metrics;
        let values = ledger.values();
        let returns = ledger.period_returns();

        let final_value = ledger.final_value();
        let total_invested = ledger.total_invested();
        let total_return = if total_invested > 0.0 {
            final_value / total_invested - 1.0
        } else {
            0.0
        };
        let years = ledger.years();
        let max_drawdown = metrics.max_drawdown(&values);
        let dates = ledger.dates();

        let row = SummaryRow {
            strategy: ledger.kind,
            final_value: self.contract.money(final_value),
            total_invested: self.contract.money(total_invested),
            total_return,
            annualized_return: metrics.annualized_return(total_return, years),
            volatility: metrics.volatility(&returns, true),
            sharpe_ratio: metrics.sharpe_ratio(&returns, risk_free_rate),
            sortino_ratio: metrics.sortino_ratio(&returns, risk_free_rate),
            max_drawdown,
            irr: metrics.irr(&ledger.investor_cash_flows(), Some(&dates)),
            calmar_ratio: metrics.calmar_ratio(total_return, max_drawdown, years),
            time_weighted_return: metrics
                .time_weighted_return(&returns, ledger.periods_per_year),
        };

        debug!(
            strategy = %row.strategy,
            final_value = %row.final_value,
            sharpe = row.sharpe_ratio,
            irr = row.irr,
            "Ledger summarized"
        );

        self.contract.round_summary(&row)
    }

    /// 두 원장을 요약하고 비교합니다.
    ///
    /// 두 원장의 연간 기간 수는 `periods_per_year`와 같아야 합니다.
    pub fn summarize(
        &self,
        first: &StrategyLedger,
        second: &StrategyLedger,
        risk_free_rate: f64,
        periods_per_year: u32,
    ) -> EngineResult<SummaryReport> {
        for ledger in [first, second] {
            if ledger.periods_per_year != periods_per_year {
                return Err(EngineError::Validation(format!(
                    "{} 원장의 연간 기간 수({})가 {}와 다릅니다",
                    ledger.kind, ledger.periods_per_year, periods_per_year
                )));
            }
            if ledger.is_empty() {
                return Err(EngineError::Validation(format!(
                    "{} 원장이 비어 있습니다",
                    ledger.kind
                )));
            }
        }

        let first_row = self.summarize_ledger(first, risk_free_rate);
        let second_row = self.summarize_ledger(second, risk_free_rate);
        let comparison = self.compare(&first_row, &second_row);

        Ok(SummaryReport {
            first: first_row,
            second: second_row,
            comparison,
        })
    }

    /// 여러 원장을 한꺼번에 요약합니다.
    pub fn summarize_all(&self, ledgers: &[StrategyLedger], risk_free_rate: f64) -> Vec<SummaryRow> {
        ledgers
            .iter()
            .map(|ledger| self.summarize_ledger(ledger, risk_free_rate))
            .collect()
    }

    /// 두 요약 행을 비교합니다 (A − B).
    ///
    /// 연환산 수익률 차이의 절대값이 임계값 미만이면 "우열 없음"입니다.
    pub fn compare(&self, first: &SummaryRow, second: &SummaryRow) -> Comparison {
        let precision = self.contract.precision();

        let higher_sharpe = if first.sharpe_ratio > second.sharpe_ratio {
            Verdict::Favors(first.strategy)
        } else if second.sharpe_ratio > first.sharpe_ratio {
            Verdict::Favors(second.strategy)
        } else {
            Verdict::NoClearWinner
        };

        let final_value_gap = first.final_value - second.final_value;
        let final_value_gap_pct = if second.final_value.is_zero() {
            0.0
        } else {
            (final_value_gap / second.final_value * Decimal::ONE_HUNDRED)
                .to_f64()
                .map(|pct| invest_core::round_f64(pct, precision.percent))
                .unwrap_or(0.0)
        };

        let annualized_return_gap = invest_core::round_f64(
            first.annualized_return - second.annualized_return,
            precision.returns,
        );

        let verdict = if annualized_return_gap.abs() < self.tie_threshold {
            Verdict::NoClearWinner
        } else if annualized_return_gap > 0.0 {
            Verdict::Favors(first.strategy)
        } else {
            Verdict::Favors(second.strategy)
        };

        Comparison {
            first: first.strategy,
            second: second.strategy,
            higher_sharpe,
            final_value_gap: final_value_gap.round_half_away(precision.currency),
            final_value_gap_pct,
            annualized_return_gap,
            verdict,
        }
    }
}

/// 세 전략 전체 실행 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// 전략별 원장 (VA_Rebalance, VA_NoSell, DCA 순)
    pub ledgers: Vec<StrategyLedger>,
    /// 전략별 요약
    pub summaries: Vec<SummaryRow>,
    /// VA 계열 각각과 DCA의 비교
    pub comparisons: Vec<Comparison>,
}

impl ComparisonReport {
    /// 전략의 요약 행
    pub fn summary(&self, kind: StrategyKind) -> Option<&SummaryRow> {
        self.summaries.iter().find(|row| row.strategy == kind)
    }

    /// 전략의 원장
    pub fn ledger(&self, kind: StrategyKind) -> Option<&StrategyLedger> {
        self.ledgers.iter().find(|ledger| ledger.kind == kind)
    }
}

/// 세 전략을 모두 실행하고 VA 계열 각각을 DCA와 비교합니다.
pub fn compare_strategies(
    params: &SimulationParameters,
    market: &[MarketDataPoint],
    precision: PrecisionConfig,
    comparison: &ComparisonConfig,
) -> EngineResult<ComparisonReport> {
    let period = ParameterConverter::convert_parameters(params)?;
    let engine = StrategyEngine::new(params.clone(), period)?.with_precision(precision);
    let aggregator = SummaryAggregator::new(precision, comparison);
    let risk_free_rate = params.risk_free_fraction();

    let ledgers = engine.run_all(market)?;
    let summaries = aggregator.summarize_all(&ledgers, risk_free_rate);

    let comparisons = match summaries
        .iter()
        .find(|row| row.strategy == StrategyKind::Dca)
    {
        Some(dca) => summaries
            .iter()
            .filter(|row| row.strategy.is_value_averaging())
            .map(|va| aggregator.compare(va, dca))
            .collect(),
        None => Vec::new(),
    };

    for comparison in &comparisons {
        info!(
            first = %comparison.first,
            second = %comparison.second,
            verdict = %comparison.verdict,
            annualized_gap = comparison.annualized_return_gap,
            "Strategies compared"
        );
    }

    Ok(ComparisonReport {
        ledgers,
        summaries,
        comparisons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Months, NaiveDate};
    use invest_core::{Frequency, StrategyLedgerRow};
    use rust_decimal_macros::dec;

    fn row(kind: StrategyKind, period: u32, cash_flow: f64, invested: f64, value: f64) -> StrategyLedgerRow {
        StrategyLedgerRow {
            period,
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Months::new(12 * period),
            risky_asset_price: 100.0,
            risk_free_yield: 0.0,
            target_value: kind.is_value_averaging().then_some(value),
            cash_flow,
            cumulative_invested: invested,
            cumulative_withdrawn: 0.0,
            stock_value: value,
            bond_value: 0.0,
            portfolio_value: value,
            period_return: 0.0,
            cumulative_return: value / invested - 1.0,
            annualized_return: 0.0,
        }
    }

    fn summary(kind: StrategyKind, final_value: Decimal, annualized: f64, sharpe: f64) -> SummaryRow {
        SummaryRow {
            strategy: kind,
            final_value,
            total_invested: dec!(1000),
            total_return: 0.0,
            annualized_return: annualized,
            volatility: 0.0,
            sharpe_ratio: sharpe,
            sortino_ratio: 0.0,
            max_drawdown: 0.0,
            irr: 0.0,
            calmar_ratio: 0.0,
            time_weighted_return: 0.0,
        }
    }

    #[test]
    fn test_summarize_ledger_lump_sum() {
        let mut ledger = StrategyLedger::new(StrategyKind::Dca, 1);
        ledger.push(row(StrategyKind::Dca, 0, 1000.0, 1000.0, 1000.0)).unwrap();
        ledger.push(row(StrategyKind::Dca, 1, 0.0, 1000.0, 1100.0)).unwrap();
        ledger.push(row(StrategyKind::Dca, 2, 0.0, 1000.0, 1210.0)).unwrap();

        let aggregator = SummaryAggregator::default();
        let summary = aggregator.summarize_ledger(&ledger, 0.0);

        assert_eq!(summary.final_value, dec!(1210.00));
        assert_eq!(summary.total_invested, dec!(1000.00));
        assert_eq!(summary.total_return, 0.21);
        assert_eq!(summary.annualized_return, 0.1);
        assert_eq!(summary.max_drawdown, 0.0);
        assert_eq!(summary.calmar_ratio, 0.0);
        // 2년(731일) 동안 연 10%에 근접
        assert!((summary.irr - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_compare_verdicts() {
        let aggregator = SummaryAggregator::default();
        let va = summary(StrategyKind::VaRebalance, dec!(1500), 0.08, 1.2);
        let dca = summary(StrategyKind::Dca, dec!(1200), 0.06, 0.9);

        let comparison = aggregator.compare(&va, &dca);
        assert_eq!(comparison.higher_sharpe, Verdict::Favors(StrategyKind::VaRebalance));
        assert_eq!(comparison.final_value_gap, dec!(300));
        assert_eq!(comparison.final_value_gap_pct, 25.0);
        assert_eq!(comparison.annualized_return_gap, 0.02);
        assert_eq!(comparison.verdict, Verdict::Favors(StrategyKind::VaRebalance));
    }

    #[test]
    fn test_compare_tie_threshold() {
        let aggregator = SummaryAggregator::new(
            PrecisionConfig::default(),
            &ComparisonConfig {
                tie_threshold: 0.005,
            },
        );
        let va = summary(StrategyKind::VaNoSell, dec!(1000), 0.061, 1.0);
        let dca = summary(StrategyKind::Dca, dec!(1000), 0.06, 1.0);

        let comparison = aggregator.compare(&va, &dca);
        assert_eq!(comparison.verdict, Verdict::NoClearWinner);
        assert_eq!(comparison.higher_sharpe, Verdict::NoClearWinner);
        assert_eq!(comparison.final_value_gap_pct, 0.0);
    }

    #[test]
    fn test_summarize_rejects_mismatched_frequency() {
        let mut ledger = StrategyLedger::new(StrategyKind::Dca, 4);
        ledger.push(row(StrategyKind::Dca, 0, 1000.0, 1000.0, 1000.0)).unwrap();

        let aggregator = SummaryAggregator::default();
        assert!(aggregator.summarize(&ledger, &ledger, 0.02, 12).is_err());
        assert!(aggregator.summarize(&ledger, &ledger, 0.02, 4).is_ok());
    }

    #[test]
    fn test_compare_strategies_flat_market() {
        let params = SimulationParameters::new(1000.0)
            .with_horizon(2, Frequency::Annually)
            .with_rates(5.0, 0.0);
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let market: Vec<MarketDataPoint> = (0..3)
            .map(|i| MarketDataPoint::from_yield(start + Months::new(12 * i), 100.0, 3.0))
            .collect();

        let report = compare_strategies(
            &params,
            &market,
            PrecisionConfig::default(),
            &ComparisonConfig::default(),
        )
        .unwrap();

        assert_eq!(report.ledgers.len(), 3);
        assert_eq!(report.summaries.len(), 3);
        assert_eq!(report.comparisons.len(), 2);

        let dca = report.summary(StrategyKind::Dca).unwrap();
        assert_eq!(dca.final_value, dca.total_invested);
        assert_eq!(dca.final_value, dec!(3000.00));

        let va = report.summary(StrategyKind::VaRebalance).unwrap();
        assert_eq!(va.final_value, dec!(1102.50));
    }

    #[test]
    fn test_dca_irr_matches_constant_market_growth() {
        // 주식 100%, 연 10% 상승, 인플레이션 조정 없음
        let params = SimulationParameters::new(1000.0)
            .with_horizon(2, Frequency::Annually)
            .with_stock_ratio(100.0)
            .with_inflation_adjusted(false);
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let market: Vec<MarketDataPoint> = [100.0, 110.0, 121.0]
            .iter()
            .enumerate()
            .map(|(i, price)| {
                MarketDataPoint::from_yield(start + Months::new(12 * i as u32), *price, 3.0)
            })
            .collect();

        let report = compare_strategies(
            &params,
            &market,
            PrecisionConfig::default(),
            &ComparisonConfig::default(),
        )
        .unwrap();

        let ledger = report.ledger(StrategyKind::Dca).unwrap();
        let flows = ledger.investor_cash_flows();
        assert_eq!(flows.len(), 3);
        assert_eq!(flows[0], -2000.0);
        assert_eq!(flows[1], -1000.0);
        assert!((flows[2] - 3520.0).abs() < 1e-6);

        let dca = report.summary(StrategyKind::Dca).unwrap();
        assert_eq!(dca.final_value, dec!(3520.00));
        assert!((dca.irr - 0.10).abs() < 1e-3);
        assert!((dca.irr - dca.time_weighted_return).abs() < 1e-3);
    }
}
