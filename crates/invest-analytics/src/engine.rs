//! 전략 엔진
//!
//! 환산된 기간 파라미터와 시장 데이터 시계열로 전략별 원장을 생성합니다.
//!
//! # 실행 시점
//!
//! - **VA (가치 평균법)**: 기간 종료 시점에 실행합니다. 직전 슬리브에 이번 기간의
//!   실현 수익률을 반영한 뒤, 목표 가치와의 차이만큼 매수(또는 매도)합니다.
//! - **DCA (정액 적립식)**: 기간 시작 시점에 실행합니다. 적립금을 먼저 투입한 뒤
//!   이번 기간의 실현 수익률을 반영합니다.
//!
//! 시장 데이터의 t번째 포인트는 기간 t의 종료 시점이며, 기간 t의 실현 수익률은
//! `S_t / S_{t−1}`(주식), `B_t / B_{t−1}`(채권)입니다. 0번째 포인트는 투자 개시
//! 시점으로, 기간 0에는 시장 변동이 없습니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use invest_analytics::{ParameterConverter, StrategyEngine};
//! use invest_core::{SimulationParameters, StrategyKind};
//!
//! let params = SimulationParameters::new(10_000.0);
//! let period = ParameterConverter::convert_parameters(&params)?;
//! let engine = StrategyEngine::new(params, period)?;
//!
//! let ledger = engine.run(StrategyKind::VaRebalance, &market_data)?;
//! println!("최종 가치: {}", ledger.final_value());
//! ```

use invest_core::{
    strategy_span, validate_series, EngineError, EngineResult, MarketDataPoint, PeriodParameters,
    PrecisionConfig, SimulationParameters, StrategyKind, StrategyLedger, StrategyLedgerRow,
    TableContract,
};
use tracing::{debug, info, warn};

use crate::metrics::Metrics;

/// g와 i가 같다고 볼 허용 오차
const RATE_EQUALITY_TOLERANCE: f64 = 1e-12;

/// 매매 실행 시점.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionTiming {
    /// 기간 시작 (시장 변동 전)
    PeriodStart,
    /// 기간 종료 (시장 변동 후)
    PeriodEnd,
}

/// 전략별 실행 정책.
///
/// 원장 행 구성, 슬리브 배분, 수익률 계산은 엔진이 공통으로 처리하고
/// 정책은 현금흐름 규칙만 결정합니다.
pub trait ExecutionPolicy: Send + Sync {
    /// 전략 종류
    fn kind(&self) -> StrategyKind;

    /// 실행 시점
    fn timing(&self) -> ExecutionTiming;

    /// 기간 t의 목표 가치 (목표가 없는 전략은 None)
    fn target_value(&self, period: u32) -> Option<f64>;

    /// 기간 t의 현금흐름.
    ///
    /// `current_value`는 실행 직전 포트폴리오 가치입니다.
    /// 기간 종료 실행은 이번 기간 수익률이 반영된 값, 기간 시작 실행은 직전 기간 가치입니다.
    fn contribution(&self, period: u32, current_value: f64) -> f64;
}

/// VA 목표 가치.
///
/// # 계산 공식
///
/// ```text
/// target(t) = C0 × (1+g)^t + C_p × (1+i) × ((1+g)^t − (1+i)^t) / (g − i)
/// g = i 인 경우 두 번째 항은 C_p × t × (1+g)^t
/// ```
///
/// - `C0`: 초기 투자금, `C_p`: 기간당 적립 예산
/// - `g`: 기간 목표 성장률, `i`: 기간 물가상승률
pub fn value_averaging_target(
    initial_investment: f64,
    period_contribution: f64,
    growth_rate: f64,
    inflation_rate: f64,
    period: u32,
) -> f64 {
    let t = period as i32;
    let grown = (1.0 + growth_rate).powi(t);
    let base = initial_investment * grown;

    if period_contribution == 0.0 {
        return base;
    }

    let annuity = if (growth_rate - inflation_rate).abs() < RATE_EQUALITY_TOLERANCE {
        period_contribution * f64::from(period) * grown
    } else {
        let escalated = (1.0 + inflation_rate).powi(t);
        period_contribution * (1.0 + inflation_rate) * (grown - escalated)
            / (growth_rate - inflation_rate)
    };

    base + annuity
}

/// 가치 평균법 정책 (Rebalance / NoSell).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueAveragingPolicy {
    allow_withdrawal: bool,
    initial_investment: f64,
    period_contribution: f64,
    growth_rate: f64,
    inflation_rate: f64,
}

impl ValueAveragingPolicy {
    /// 새 정책을 생성합니다.
    pub fn new(
        allow_withdrawal: bool,
        params: &SimulationParameters,
        period: &PeriodParameters,
    ) -> Self {
        Self {
            allow_withdrawal,
            initial_investment: params.initial_investment,
            period_contribution: period.period_contribution,
            growth_rate: period.period_growth_rate,
            inflation_rate: period.period_inflation_rate,
        }
    }
}

impl ExecutionPolicy for ValueAveragingPolicy {
    fn kind(&self) -> StrategyKind {
        if self.allow_withdrawal {
            StrategyKind::VaRebalance
        } else {
            StrategyKind::VaNoSell
        }
    }

    fn timing(&self) -> ExecutionTiming {
        ExecutionTiming::PeriodEnd
    }

    fn target_value(&self, period: u32) -> Option<f64> {
        Some(value_averaging_target(
            self.initial_investment,
            self.period_contribution,
            self.growth_rate,
            self.inflation_rate,
            period,
        ))
    }

    fn contribution(&self, period: u32, current_value: f64) -> f64 {
        let target = self.target_value(period).unwrap_or(0.0);
        let gap = target - current_value;
        if self.allow_withdrawal {
            gap
        } else {
            gap.max(0.0)
        }
    }
}

/// 정액 적립식 정책.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedContributionPolicy {
    initial_investment: f64,
    base_amount: f64,
    inflation_rate: Option<f64>,
}

impl FixedContributionPolicy {
    /// 새 정책을 생성합니다.
    ///
    /// 기준 금액은 연간 적립 예산이 있으면 기간당 예산, 없으면 초기 투자금입니다.
    pub fn new(params: &SimulationParameters, period: &PeriodParameters) -> Self {
        let base_amount = if period.period_contribution > 0.0 {
            period.period_contribution
        } else {
            params.initial_investment
        };
        Self {
            initial_investment: params.initial_investment,
            base_amount,
            inflation_rate: params
                .inflation_adjusted
                .then_some(period.period_inflation_rate),
        }
    }

    /// 기간 1 이후 적립 기준 금액
    pub fn base_amount(&self) -> f64 {
        self.base_amount
    }
}

impl ExecutionPolicy for FixedContributionPolicy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Dca
    }

    fn timing(&self) -> ExecutionTiming {
        ExecutionTiming::PeriodStart
    }

    fn target_value(&self, _period: u32) -> Option<f64> {
        None
    }

    fn contribution(&self, period: u32, _current_value: f64) -> f64 {
        if period == 0 {
            return self.initial_investment;
        }
        match self.inflation_rate {
            Some(rate) => self.base_amount * (1.0 + rate).powi(period as i32),
            None => self.base_amount,
        }
    }
}

/// 전략 종류에 맞는 실행 정책을 생성합니다.
pub fn policy_for(
    kind: StrategyKind,
    params: &SimulationParameters,
    period: &PeriodParameters,
) -> Box<dyn ExecutionPolicy> {
    match kind {
        StrategyKind::VaRebalance => Box::new(ValueAveragingPolicy::new(true, params, period)),
        StrategyKind::VaNoSell => Box::new(ValueAveragingPolicy::new(false, params, period)),
        StrategyKind::Dca => Box::new(FixedContributionPolicy::new(params, period)),
    }
}

/// 전략 엔진.
#[derive(Debug, Clone)]
pub struct StrategyEngine {
    params: SimulationParameters,
    period: PeriodParameters,
    metrics: Metrics,
    contract: TableContract,
}

impl StrategyEngine {
    /// 파라미터를 검증하고 엔진을 생성합니다.
    pub fn new(params: SimulationParameters, period: PeriodParameters) -> EngineResult<Self> {
        params.validate()?;

        if period.frequency != params.frequency
            || period.periods_per_year != params.frequency.periods_per_year()
            || period.total_periods != params.total_periods()
        {
            return Err(EngineError::Validation(format!(
                "기간 파라미터가 시뮬레이션 파라미터와 맞지 않습니다: {} {}기간 / {} {}기간",
                period.frequency,
                period.total_periods,
                params.frequency,
                params.total_periods()
            )));
        }

        Ok(Self {
            params,
            period,
            metrics: Metrics::default(),
            contract: TableContract::default(),
        })
    }

    /// 반올림 자릿수 설정
    pub fn with_precision(mut self, precision: PrecisionConfig) -> Self {
        self.metrics = Metrics::new(precision);
        self.contract = TableContract::new(precision);
        self
    }

    /// 시뮬레이션 파라미터
    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// 기간 파라미터
    pub fn period(&self) -> &PeriodParameters {
        &self.period
    }

    /// 전략 원장을 생성합니다.
    pub fn run(&self, kind: StrategyKind, market: &[MarketDataPoint]) -> EngineResult<StrategyLedger> {
        let policy = policy_for(kind, &self.params, &self.period);
        self.run_with_policy(policy.as_ref(), market)
    }

    /// 세 전략 모두의 원장을 생성합니다.
    pub fn run_all(&self, market: &[MarketDataPoint]) -> EngineResult<Vec<StrategyLedger>> {
        StrategyKind::ALL
            .iter()
            .map(|kind| self.run(*kind, market))
            .collect()
    }

    /// 주어진 정책으로 원장을 생성합니다.
    pub fn run_with_policy(
        &self,
        policy: &dyn ExecutionPolicy,
        market: &[MarketDataPoint],
    ) -> EngineResult<StrategyLedger> {
        let kind = policy.kind();
        let span = strategy_span!(
            "strategy_run",
            kind,
            self.period.total_periods,
            self.period.frequency
        );
        let _guard = span.enter();

        let required = self.period.required_market_points();
        let window = validate_series(market, required)?;
        if market.len() > required {
            warn!(
                provided = market.len(),
                required,
                "Ignoring surplus market data points"
            );
        }

        info!(
            initial_investment = self.params.initial_investment,
            periods = self.period.total_periods,
            "Strategy run started"
        );

        let stock_weight = self.params.stock_weight();
        let bond_weight = self.params.bond_weight();
        let periods_per_year = f64::from(self.period.periods_per_year);

        let mut ledger =
            StrategyLedger::with_capacity(kind, self.period.periods_per_year, window.len());
        let mut stock_value = 0.0_f64;
        let mut bond_value = 0.0_f64;
        let mut previous_value = 0.0_f64;
        let mut invested = 0.0_f64;
        let mut withdrawn = 0.0_f64;

        for (index, point) in window.iter().enumerate() {
            let period = index as u32;
            let (stock_growth, bond_growth) = if index == 0 {
                (1.0, 1.0)
            } else {
                let prev = &window[index - 1];
                (
                    point.risky_asset_price / prev.risky_asset_price,
                    point.risk_free_price / prev.risk_free_price,
                )
            };

            let (cash_flow, period_return) = match policy.timing() {
                ExecutionTiming::PeriodEnd => {
                    stock_value *= stock_growth;
                    bond_value *= bond_growth;
                    let carried = stock_value + bond_value;

                    let cash_flow = policy.contribution(period, carried);
                    if cash_flow < 0.0 && carried > 0.0 {
                        // 인출은 현재 슬리브 비율대로 (어느 슬리브도 음수가 되지 않음)
                        let keep = ((carried + cash_flow) / carried).max(0.0);
                        stock_value *= keep;
                        bond_value *= keep;
                    } else {
                        stock_value += cash_flow * stock_weight;
                        bond_value += cash_flow * bond_weight;
                    }

                    (cash_flow, ratio_minus_one(carried, previous_value))
                }
                ExecutionTiming::PeriodStart => {
                    let cash_flow = policy.contribution(period, previous_value);
                    stock_value += cash_flow * stock_weight;
                    bond_value += cash_flow * bond_weight;
                    let funded = stock_value + bond_value;

                    stock_value *= stock_growth;
                    bond_value *= bond_growth;

                    (cash_flow, ratio_minus_one(stock_value + bond_value, funded))
                }
            };

            if cash_flow >= 0.0 {
                invested += cash_flow;
            } else {
                withdrawn += -cash_flow;
            }

            let portfolio_value = stock_value + bond_value;
            let cumulative_return = if invested > 0.0 {
                portfolio_value / invested - 1.0
            } else {
                0.0
            };
            let annualized_return = self
                .metrics
                .annualized_return(cumulative_return, f64::from(period) / periods_per_year);

            debug!(
                period,
                cash_flow,
                portfolio_value,
                period_return,
                "Period executed"
            );

            ledger.push(StrategyLedgerRow {
                period,
                date: point.date,
                risky_asset_price: point.risky_asset_price,
                risk_free_yield: point.risk_free_yield,
                target_value: policy.target_value(period),
                cash_flow,
                cumulative_invested: invested,
                cumulative_withdrawn: withdrawn,
                stock_value,
                bond_value,
                portfolio_value,
                period_return: if index == 0 { 0.0 } else { period_return },
                cumulative_return,
                annualized_return,
            })?;

            previous_value = portfolio_value;
        }

        self.contract.validate_ledger(&ledger)?;

        info!(
            final_value = ledger.final_value(),
            total_invested = ledger.total_invested(),
            "Strategy run finished"
        );

        Ok(ledger)
    }
}

/// `numerator / denominator − 1`, 분모가 0 이하이면 0
fn ratio_minus_one(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator - 1.0
    } else {
        0.0
    }
}

/// 단일 전략 원장을 생성합니다.
///
/// 시장 데이터는 `total_periods + 1`개 이상이어야 하며 초과분은 무시됩니다.
pub fn run_strategy(
    kind: StrategyKind,
    params: &SimulationParameters,
    period: &PeriodParameters,
    market: &[MarketDataPoint],
) -> EngineResult<StrategyLedger> {
    StrategyEngine::new(params.clone(), *period)?.run(kind, market)
}
