//! 성과 지표 계산 모듈
//!
//! 전략 원장의 가치/수익률/현금흐름 시계열에서 다음 지표를 계산합니다:
//! - 내부수익률 (IRR): 뉴턴-랩슨 반복법
//! - 연환산 수익률 (Annualized Return)
//! - 변동성 (Volatility): 표본 표준편차
//! - 샤프 비율 (Sharpe Ratio): 위험 대비 초과 수익
//! - 소르티노 비율 (Sortino Ratio): 하방 위험 대비 초과 수익
//! - 최대 낙폭 (Maximum Drawdown): 고점 대비 최대 하락률
//! - 칼마 비율 (Calmar Ratio): 연환산 수익률 / |최대 낙폭|
//! - 시간가중수익률 (TWR): 기간 수익률의 기하 연결
//!
//! 모든 함수는 상태가 없고 순수합니다. 데이터가 2개 미만이거나 분산이 0인
//! 퇴화 입력에는 에러 대신 0.0을 반환합니다 (소르티노는 예외적으로 +∞).
//! 수익률과 무위험 이자율은 모두 소수 단위입니다 (0.02 = 2%).
//!
//! # 사용 예시
//!
//! ```rust
//! use invest_analytics::metrics::Metrics;
//!
//! let metrics = Metrics::default();
//! let irr = metrics.irr(&[-1000.0, 1100.0], None);
//! assert!((irr - 0.10).abs() < 1e-4);
//! ```

use chrono::NaiveDate;
use invest_core::{round_f64, PrecisionConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// IRR 초기 추정값
pub const IRR_INITIAL_GUESS: f64 = 0.1;

/// IRR 최대 반복 횟수
pub const IRR_MAX_ITERATIONS: usize = 100;

/// IRR 수렴 허용 오차 (|NPV| 및 |dNPV| 기준)
pub const IRR_TOLERANCE: f64 = 1e-6;

/// IRR 허용 범위. 범위를 벗어난 해는 비현실적인 값으로 간주합니다.
pub const IRR_BOUNDS: (f64, f64) = (-0.99, 10.0);

/// 날짜 기반 IRR의 연간 일수
pub const DAYS_PER_YEAR: f64 = 365.25;

/// 이 값 이하의 표준편차는 분산 0으로 취급
const ZERO_VARIANCE_EPSILON: f64 = 1e-12;

/// IRR 계산 결과.
///
/// [`Metrics::irr`]는 이 결과를 단일 값으로 축약하며,
/// `Converged`가 아닌 경우 모두 0.0을 반환합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IrrOutcome {
    /// 허용 범위 내에서 수렴
    Converged {
        /// 기간(또는 연) 수익률
        rate: f64,
        /// 반복 횟수
        iterations: usize,
    },
    /// 반복 한도 도달, 도함수 소실, 또는 현금흐름이 부족함
    NotConverged {
        /// 마지막 추정값
        last_rate: f64,
        /// 반복 횟수
        iterations: usize,
    },
    /// 수렴했으나 허용 범위 밖의 해
    OutOfRange {
        /// 거부된 해
        rate: f64,
    },
}

impl IrrOutcome {
    /// 수렴한 경우의 수익률
    pub fn rate(&self) -> Option<f64> {
        match self {
            IrrOutcome::Converged { rate, .. } => Some(*rate),
            _ => None,
        }
    }

    /// 수렴 여부
    pub fn is_converged(&self) -> bool {
        matches!(self, IrrOutcome::Converged { .. })
    }
}

/// 성과 지표 계산기.
///
/// 반올림 자릿수는 주입된 [`PrecisionConfig`]를 따릅니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    precision: PrecisionConfig,
}

impl Metrics {
    /// 주어진 자릿수 설정으로 계산기를 생성합니다.
    pub fn new(precision: PrecisionConfig) -> Self {
        Self { precision }
    }

    /// 자릿수 설정
    pub fn precision(&self) -> &PrecisionConfig {
        &self.precision
    }

    /// 내부수익률(IRR)을 계산합니다.
    ///
    /// 수렴하지 않거나 해가 [`IRR_BOUNDS`] 밖이면 0.0을 반환합니다.
    /// 결과는 수익률 자릿수(기본 4자리)로 반올림됩니다.
    pub fn irr(&self, cash_flows: &[f64], dates: Option<&[NaiveDate]>) -> f64 {
        match self.solve_irr(cash_flows, dates) {
            IrrOutcome::Converged { rate, .. } => round_f64(rate, self.precision.returns),
            IrrOutcome::NotConverged {
                last_rate,
                iterations,
            } => {
                if cash_flows.len() >= 2 {
                    warn!(last_rate, iterations, "IRR did not converge; falling back to 0.0");
                }
                0.0
            }
            IrrOutcome::OutOfRange { rate } => {
                warn!(rate, "IRR outside plausible range; falling back to 0.0");
                0.0
            }
        }
    }

    /// 뉴턴-랩슨 반복법으로 IRR을 구합니다.
    ///
    /// # 계산 공식
    ///
    /// ```text
    /// NPV(r)  = Σ cf_i / (1 + r)^t_i
    /// NPV'(r) = Σ −t_i × cf_i / (1 + r)^(t_i + 1)
    /// r_next  = r − NPV(r) / NPV'(r)
    /// ```
    ///
    /// `t_i`는 날짜가 주어지면 첫 날짜로부터의 경과 연수(일수 / 365.25),
    /// 아니면 기간 인덱스입니다. 날짜 수가 현금흐름 수와 다르면 기간 인덱스를 사용합니다.
    pub fn solve_irr(&self, cash_flows: &[f64], dates: Option<&[NaiveDate]>) -> IrrOutcome {
        if cash_flows.len() < 2
            || cash_flows.iter().any(|cf| !cf.is_finite())
            || cash_flows.iter().sum::<f64>() == 0.0
        {
            return IrrOutcome::NotConverged {
                last_rate: IRR_INITIAL_GUESS,
                iterations: 0,
            };
        }

        let times: Vec<f64> = match dates {
            Some(dates) if dates.len() == cash_flows.len() => {
                let start = dates[0];
                dates
                    .iter()
                    .map(|d| (*d - start).num_days() as f64 / DAYS_PER_YEAR)
                    .collect()
            }
            Some(dates) => {
                warn!(
                    dates = dates.len(),
                    flows = cash_flows.len(),
                    "IRR date count mismatch; using period index"
                );
                (0..cash_flows.len()).map(|i| i as f64).collect()
            }
            None => (0..cash_flows.len()).map(|i| i as f64).collect(),
        };

        let mut rate = IRR_INITIAL_GUESS;
        for iteration in 0..IRR_MAX_ITERATIONS {
            let (npv, derivative) = npv_with_derivative(cash_flows, &times, rate);

            if npv.abs() < IRR_TOLERANCE {
                return Self::bounded(rate, iteration);
            }
            if !derivative.is_finite() || derivative.abs() < IRR_TOLERANCE {
                return IrrOutcome::NotConverged {
                    last_rate: rate,
                    iterations: iteration,
                };
            }

            let next = rate - npv / derivative;
            // (1 + r) ≤ 0 이면 분수 지수의 할인계수가 정의되지 않음
            if !next.is_finite() || next <= -1.0 {
                return IrrOutcome::OutOfRange { rate: next };
            }
            rate = next;
        }

        let (npv, _) = npv_with_derivative(cash_flows, &times, rate);
        if npv.abs() < IRR_TOLERANCE {
            return Self::bounded(rate, IRR_MAX_ITERATIONS);
        }
        IrrOutcome::NotConverged {
            last_rate: rate,
            iterations: IRR_MAX_ITERATIONS,
        }
    }

    fn bounded(rate: f64, iterations: usize) -> IrrOutcome {
        let (min, max) = IRR_BOUNDS;
        if rate < min || rate > max {
            IrrOutcome::OutOfRange { rate }
        } else {
            IrrOutcome::Converged { rate, iterations }
        }
    }

    /// 총 수익률을 연환산합니다.
    ///
    /// # 계산 공식
    ///
    /// ```text
    /// annualized = (1 + total_return)^(1 / years) − 1
    /// ```
    ///
    /// 원금이 모두 손실된 경우(total_return = −1)는 −1.0입니다.
    /// `years ≤ 0`, 유한하지 않은 값, total_return < −1이면 0.0입니다.
    pub fn annualized_return(&self, total_return: f64, years: f64) -> f64 {
        if years <= 0.0 || !total_return.is_finite() || total_return < -1.0 {
            return 0.0;
        }
        if total_return == -1.0 {
            return -1.0;
        }
        round_f64(
            (1.0 + total_return).powf(1.0 / years) - 1.0,
            self.precision.returns,
        )
    }

    /// 변동성 (표본 표준편차, n−1 분모).
    ///
    /// `annualize`가 참이면 `sqrt(len(returns))`를 곱합니다.
    pub fn volatility(&self, returns: &[f64], annualize: bool) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let std = sample_std(returns);
        let scaled = if annualize {
            std * (returns.len() as f64).sqrt()
        } else {
            std
        };
        round_f64(scaled, self.precision.returns)
    }

    /// 샤프 비율을 계산합니다.
    ///
    /// # 계산 공식
    ///
    /// ```text
    /// excess_i = r_i − rf / N
    /// sharpe   = mean(excess) / std(excess) × sqrt(N)
    /// ```
    ///
    /// 무위험 이자율은 N개 기간에 균등 배분됩니다. 소수점 3자리.
    pub fn sharpe_ratio(&self, returns: &[f64], risk_free_rate: f64) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let n = returns.len() as f64;
        let excess = excess_returns(returns, risk_free_rate);
        let std = sample_std(&excess);
        if std <= ZERO_VARIANCE_EPSILON || !std.is_finite() {
            return 0.0;
        }
        round_f64(mean(&excess) / std * n.sqrt(), self.precision.ratio)
    }

    /// 소르티노 비율을 계산합니다.
    ///
    /// 샤프 비율과 같지만 분모는 음수 초과수익만의 표본 표준편차입니다.
    ///
    /// - 음수 초과수익이 없으면 +∞
    /// - 음수 초과수익이 1개뿐이거나 하방 편차가 0이면 0.0
    pub fn sortino_ratio(&self, returns: &[f64], risk_free_rate: f64) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let n = returns.len() as f64;
        let excess = excess_returns(returns, risk_free_rate);
        let downside: Vec<f64> = excess.iter().copied().filter(|r| *r < 0.0).collect();

        if downside.is_empty() {
            return f64::INFINITY;
        }
        if downside.len() < 2 {
            return 0.0;
        }
        let downside_std = sample_std(&downside);
        if downside_std <= ZERO_VARIANCE_EPSILON || !downside_std.is_finite() {
            return 0.0;
        }
        round_f64(mean(&excess) / downside_std * n.sqrt(), self.precision.ratio)
    }

    /// 최대 낙폭을 계산합니다.
    ///
    /// # 계산 공식
    ///
    /// ```text
    /// MDD = min_t((V_t − max_{s≤t} V_s) / max_{s≤t} V_s)
    /// ```
    ///
    /// 항상 0 이하이며, 감소하지 않는 시계열은 0.0입니다.
    /// 누적 최고값이 0 이하인 구간은 낙폭을 정의할 수 없으므로 건너뜁니다.
    pub fn max_drawdown(&self, values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }

        let mut peak = values[0];
        let mut max_drawdown = 0.0_f64;
        for &value in values {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                let drawdown = (value - peak) / peak;
                if drawdown < max_drawdown {
                    max_drawdown = drawdown;
                }
            }
        }

        round_f64(max_drawdown, self.precision.returns)
    }

    /// 칼마 비율을 계산합니다.
    ///
    /// `years ≤ 0`이거나 낙폭이 없으면(max_drawdown ≥ 0) 0.0입니다. 소수점 3자리.
    pub fn calmar_ratio(&self, total_return: f64, max_drawdown: f64, years: f64) -> f64 {
        if years <= 0.0 || max_drawdown >= 0.0 {
            return 0.0;
        }
        let annualized = self.annualized_return(total_return, years);
        round_f64(annualized / max_drawdown.abs(), self.precision.ratio)
    }

    /// 시간가중수익률(TWR)을 연환산하여 계산합니다.
    ///
    /// # 계산 공식
    ///
    /// ```text
    /// TWR = [(1 + R_1) × ... × (1 + R_n)]^(periods_per_year / n) − 1
    /// ```
    ///
    /// 현금흐름 시점과 규모의 영향을 제거한 운용 성과입니다.
    pub fn time_weighted_return(&self, period_returns: &[f64], periods_per_year: u32) -> f64 {
        let valid: Vec<f64> = period_returns
            .iter()
            .copied()
            .filter(|r| r.is_finite())
            .collect();
        if valid.is_empty() || periods_per_year == 0 {
            return 0.0;
        }

        let compound: f64 = valid.iter().map(|r| 1.0 + r).product();
        let years = valid.len() as f64 / f64::from(periods_per_year);
        if compound <= 0.0 {
            return 0.0;
        }
        round_f64(compound.powf(1.0 / years) - 1.0, self.precision.returns)
    }
}

/// NPV와 NPV의 r에 대한 도함수
fn npv_with_derivative(cash_flows: &[f64], times: &[f64], rate: f64) -> (f64, f64) {
    cash_flows
        .iter()
        .zip(times)
        .fold((0.0, 0.0), |(npv, derivative), (&cf, &t)| {
            if t == 0.0 {
                return (npv + cf, derivative);
            }
            let discount = (1.0 + rate).powf(t);
            (
                npv + cf / discount,
                derivative - t * cf / (discount * (1.0 + rate)),
            )
        })
}

fn excess_returns(returns: &[f64], risk_free_rate: f64) -> Vec<f64> {
    let per_period_rf = risk_free_rate / returns.len() as f64;
    returns.iter().map(|r| r - per_period_rf).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_irr_two_flows() {
        let metrics = Metrics::default();
        let irr = metrics.irr(&[-1000.0, 1100.0], None);
        assert!((irr - 0.10).abs() < 1e-4);

        let outcome = metrics.solve_irr(&[-1000.0, 1100.0], None);
        assert!(outcome.is_converged());
    }

    #[test]
    fn test_irr_with_dates() {
        let metrics = Metrics::default();
        // 2년 후 1210 → 연 10%
        let dates = [date(2020, 1, 1), date(2022, 1, 1)];
        let irr = metrics.irr(&[-1000.0, 1210.0], Some(&dates));
        assert!((irr - 0.10).abs() < 1e-3);
    }

    #[test]
    fn test_irr_periodic_contributions() {
        let metrics = Metrics::default();
        // 두 번 적립 후 회수: 100×1.1² + 100×1.1 = 231
        let irr = metrics.irr(&[-100.0, -100.0, 231.0], None);
        assert!((irr - 0.10).abs() < 1e-4);
    }

    #[test]
    fn test_irr_degenerate() {
        let metrics = Metrics::default();
        assert_eq!(metrics.irr(&[], None), 0.0);
        assert_eq!(metrics.irr(&[-1000.0], None), 0.0);
        assert_eq!(metrics.irr(&[-1000.0, 1000.0], None), 0.0);
        // 부호 변화가 없으면 해가 없음
        assert_eq!(metrics.irr(&[100.0, 100.0], None), 0.0);
        assert!(!metrics.solve_irr(&[100.0, 100.0], None).is_converged());
    }

    #[test]
    fn test_irr_out_of_range() {
        let metrics = Metrics::default();
        // 1기간에 20배 → 1900%
        let outcome = metrics.solve_irr(&[-100.0, 2000.0], None);
        assert!(matches!(outcome, IrrOutcome::OutOfRange { .. }));
        assert_eq!(metrics.irr(&[-100.0, 2000.0], None), 0.0);
    }

    #[test]
    fn test_annualized_return() {
        let metrics = Metrics::default();
        assert_eq!(metrics.annualized_return(0.21, 2.0), 0.1);
        assert_eq!(metrics.annualized_return(0.5, 0.0), 0.0);
        assert_eq!(metrics.annualized_return(0.5, -1.0), 0.0);
        assert_eq!(metrics.annualized_return(-1.0, 2.0), -1.0);
        assert_eq!(metrics.annualized_return(-1.5, 2.0), 0.0);
        assert_eq!(metrics.annualized_return(f64::NAN, 2.0), 0.0);
    }

    #[test]
    fn test_calmar_ratio_total_loss() {
        let metrics = Metrics::default();
        assert_eq!(metrics.calmar_ratio(-1.0, -1.0, 2.0), -1.0);
    }

    #[test]
    fn test_volatility() {
        let metrics = Metrics::default();
        // 표본 표준편차 = 1.0
        let returns = [1.0, 2.0, 3.0];
        assert_eq!(metrics.volatility(&returns, false), 1.0);
        assert_eq!(metrics.volatility(&returns, true), round_f64(3.0_f64.sqrt(), 4));
        assert_eq!(metrics.volatility(&[0.1], true), 0.0);
    }

    #[test]
    fn test_sharpe_ratio() {
        let metrics = Metrics::default();
        assert_eq!(metrics.sharpe_ratio(&[0.01, 0.01, 0.01, 0.01], 0.02), 0.0);
        assert_eq!(metrics.sharpe_ratio(&[0.01], 0.02), 0.0);

        let returns = [0.02, -0.01, 0.03, 0.01];
        let sharpe = metrics.sharpe_ratio(&returns, 0.0);
        // mean 0.0125, std 0.01708 → 0.7319 × 2
        assert!((sharpe - 1.464).abs() < 1e-3);
    }

    #[test]
    fn test_sortino_ratio() {
        let metrics = Metrics::default();
        assert!(metrics.sortino_ratio(&[0.01, 0.02, 0.03], 0.0).is_infinite());
        // 음수 초과수익 1개
        assert_eq!(metrics.sortino_ratio(&[0.01, -0.02, 0.03], 0.0), 0.0);

        let returns = [0.03, -0.01, 0.04, -0.03];
        let sortino = metrics.sortino_ratio(&returns, 0.0);
        // mean 0.0075, downside std 0.014142 → 0.5303 × 2
        assert!((sortino - 1.061).abs() < 1e-3);
    }

    #[test]
    fn test_max_drawdown() {
        let metrics = Metrics::default();
        assert_eq!(metrics.max_drawdown(&[100.0, 110.0, 120.0, 130.0]), 0.0);
        assert_eq!(metrics.max_drawdown(&[100.0, 120.0, 90.0, 130.0]), -0.25);
        assert_eq!(metrics.max_drawdown(&[100.0]), 0.0);
    }

    #[test]
    fn test_calmar_ratio() {
        let metrics = Metrics::default();
        assert_eq!(metrics.calmar_ratio(0.21, -0.25, 2.0), 0.4);
        assert_eq!(metrics.calmar_ratio(0.21, 0.0, 2.0), 0.0);
        assert_eq!(metrics.calmar_ratio(0.21, -0.25, 0.0), 0.0);
    }

    #[test]
    fn test_time_weighted_return() {
        let metrics = Metrics::default();
        // 4분기 각 2.4114% → 연 10%
        let quarterly = 1.1_f64.powf(0.25) - 1.0;
        let twr = metrics.time_weighted_return(&[quarterly; 4], 4);
        assert!((twr - 0.1).abs() < 1e-4);

        assert_eq!(metrics.time_weighted_return(&[], 4), 0.0);
        assert_eq!(metrics.time_weighted_return(&[-1.0, 0.1], 1), 0.0);
    }

    #[test]
    fn test_custom_precision() {
        let metrics = Metrics::new(PrecisionConfig {
            ratio: 1,
            ..Default::default()
        });
        let returns = [0.02, -0.01, 0.03, 0.01];
        assert_eq!(metrics.sharpe_ratio(&returns, 0.0), 1.5);
    }
}
