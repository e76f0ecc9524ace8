//! 전략 계산 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 연 단위 → 기간 단위 파라미터 환산
//! - VA(가치 평균법) / DCA(정액 적립식) 원장 생성
//! - 성과 지표 계산 (IRR, 샤프, 소르티노, 칼마, 최대 낙폭 등)
//! - 전략 요약 및 비교
//! - 시드 고정 합성 시장 데이터
//!
//! # Re-exports
//!
//! - [`conversion`]: ParameterConverter
//! - [`engine`]: StrategyEngine, run_strategy, 실행 정책
//! - [`metrics`]: Metrics, IrrOutcome
//! - [`summary`]: SummaryAggregator, compare_strategies
//! - [`simulation`]: SyntheticMarketGenerator

pub mod conversion;
pub mod engine;
pub mod metrics;
pub mod simulation;
pub mod summary;

pub use conversion::ParameterConverter;
pub use engine::{
    policy_for, run_strategy, value_averaging_target, ExecutionPolicy, ExecutionTiming,
    FixedContributionPolicy, StrategyEngine, ValueAveragingPolicy,
};
pub use metrics::{IrrOutcome, Metrics};
pub use simulation::SyntheticMarketGenerator;
pub use summary::{compare_strategies, ComparisonReport, SummaryAggregator};

use invest_core::{
    EngineResult, Frequency, PeriodParameters, SimulationParameters, StrategyLedger, SummaryReport,
};

/// 연 단위 비율(퍼센트)을 기간 파라미터로 환산합니다.
pub fn convert_parameters(
    investment_years: u32,
    frequency: Frequency,
    annual_growth_rate: f64,
    annual_inflation_rate: f64,
    annual_stock_volatility: f64,
    annual_bond_volatility: f64,
) -> EngineResult<PeriodParameters> {
    ParameterConverter::new(investment_years)?.convert(
        frequency,
        annual_growth_rate,
        annual_inflation_rate,
        annual_stock_volatility,
        annual_bond_volatility,
    )
}

/// 두 원장을 기본 설정으로 요약하고 비교합니다.
pub fn summarize(
    first: &StrategyLedger,
    second: &StrategyLedger,
    risk_free_rate: f64,
    periods_per_year: u32,
) -> EngineResult<SummaryReport> {
    SummaryAggregator::default().summarize(first, second, risk_free_rate, periods_per_year)
}

/// 시뮬레이션 파라미터 전체를 환산합니다.
pub fn convert_simulation_parameters(params: &SimulationParameters) -> EngineResult<PeriodParameters> {
    ParameterConverter::convert_parameters(params)
}
