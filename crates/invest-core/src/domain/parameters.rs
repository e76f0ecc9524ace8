//! 시뮬레이션 파라미터와 기간 파라미터.
//!
//! 모든 비율 입력은 퍼센트 단위입니다 (예: 8.0 = 8%).
//! 기간 파라미터의 비율은 소수 단위입니다 (예: 0.0194 = 1.94%).

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::types::Frequency;

/// 최소 투자 연수
pub const MIN_INVESTMENT_YEARS: u32 = 1;

/// 최대 투자 연수 (월 빈도 기준 480기간)
pub const MAX_INVESTMENT_YEARS: u32 = 40;

/// VA 목표 성장률 허용 범위 (%)
pub const GROWTH_RATE_RANGE: (f64, f64) = (-20.0, 50.0);

/// DCA 물가상승률 허용 범위 (%)
pub const INFLATION_RATE_RANGE: (f64, f64) = (0.0, 15.0);

/// 비율 합계 허용 오차
const RATIO_TOLERANCE: f64 = 1e-6;

/// 시뮬레이션 파라미터.
///
/// 한 번의 실행 동안 변경되지 않습니다. 엔진에 넘기기 전에
/// [`SimulationParameters::validate`]로 검증해야 합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// 초기 투자금 (C0)
    #[serde(default = "default_initial_investment")]
    pub initial_investment: f64,

    /// 연간 적립 예산 (기간당 C_period = annual_investment / periods_per_year)
    ///
    /// 0이면 VA 목표는 C0의 복리 성장만으로 정의되고,
    /// DCA는 매 기간 C0를 기준 금액으로 적립합니다.
    #[serde(default)]
    pub annual_investment: f64,

    /// 투자 연수
    #[serde(default = "default_investment_years")]
    pub investment_years: u32,

    /// 투자 빈도
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,

    /// 주식 비중 (%)
    #[serde(default = "default_stock_ratio")]
    pub stock_ratio: f64,

    /// 채권 비중 (%)
    #[serde(default = "default_bond_ratio")]
    pub bond_ratio: f64,

    /// VA 목표 연 성장률 (%, 음수 허용)
    #[serde(default = "default_growth_rate")]
    pub annual_growth_rate: f64,

    /// DCA 연 물가상승률 (%)
    #[serde(default = "default_inflation_rate")]
    pub annual_inflation_rate: f64,

    /// 연 무위험 이자율 (%)
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// DCA 적립금에 물가상승률을 반영할지 여부
    #[serde(default = "default_inflation_adjusted")]
    pub inflation_adjusted: bool,

    /// 주식 연 변동성 (%)
    #[serde(default = "default_stock_volatility")]
    pub stock_volatility: f64,

    /// 채권 연 변동성 (%)
    #[serde(default = "default_bond_volatility")]
    pub bond_volatility: f64,
}

fn default_initial_investment() -> f64 {
    10_000.0
}
fn default_investment_years() -> u32 {
    10
}
fn default_frequency() -> Frequency {
    Frequency::Quarterly
}
fn default_stock_ratio() -> f64 {
    60.0
}
fn default_bond_ratio() -> f64 {
    40.0
}
fn default_growth_rate() -> f64 {
    8.0
}
fn default_inflation_rate() -> f64 {
    2.0
}
fn default_risk_free_rate() -> f64 {
    2.0
}
fn default_inflation_adjusted() -> bool {
    true
}
fn default_stock_volatility() -> f64 {
    18.0
}
fn default_bond_volatility() -> f64 {
    5.0
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            initial_investment: default_initial_investment(),
            annual_investment: 0.0,
            investment_years: default_investment_years(),
            frequency: default_frequency(),
            stock_ratio: default_stock_ratio(),
            bond_ratio: default_bond_ratio(),
            annual_growth_rate: default_growth_rate(),
            annual_inflation_rate: default_inflation_rate(),
            risk_free_rate: default_risk_free_rate(),
            inflation_adjusted: default_inflation_adjusted(),
            stock_volatility: default_stock_volatility(),
            bond_volatility: default_bond_volatility(),
        }
    }
}

impl SimulationParameters {
    /// 초기 투자금으로 기본 파라미터를 생성합니다.
    pub fn new(initial_investment: f64) -> Self {
        Self {
            initial_investment,
            ..Default::default()
        }
    }

    /// 투자 기간과 빈도 설정
    pub fn with_horizon(mut self, years: u32, frequency: Frequency) -> Self {
        self.investment_years = years;
        self.frequency = frequency;
        self
    }

    /// 주식 비중 설정 (채권 비중은 나머지로 자동 설정)
    pub fn with_stock_ratio(mut self, stock_ratio: f64) -> Self {
        self.stock_ratio = stock_ratio;
        self.bond_ratio = 100.0 - stock_ratio;
        self
    }

    /// VA 목표 성장률과 DCA 물가상승률 설정
    pub fn with_rates(mut self, annual_growth_rate: f64, annual_inflation_rate: f64) -> Self {
        self.annual_growth_rate = annual_growth_rate;
        self.annual_inflation_rate = annual_inflation_rate;
        self
    }

    /// 연간 적립 예산 설정
    pub fn with_annual_investment(mut self, annual_investment: f64) -> Self {
        self.annual_investment = annual_investment;
        self
    }

    /// 무위험 이자율 설정
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// DCA 물가 연동 여부 설정
    pub fn with_inflation_adjusted(mut self, enabled: bool) -> Self {
        self.inflation_adjusted = enabled;
        self
    }

    /// 총 기간 수 (years × periods_per_year)
    pub fn total_periods(&self) -> u32 {
        self.investment_years * self.frequency.periods_per_year()
    }

    /// 주식 비중 (0~1)
    pub fn stock_weight(&self) -> f64 {
        self.stock_ratio / 100.0
    }

    /// 채권 비중 (0~1)
    pub fn bond_weight(&self) -> f64 {
        self.bond_ratio / 100.0
    }

    /// 무위험 이자율 (소수 단위)
    pub fn risk_free_fraction(&self) -> f64 {
        self.risk_free_rate / 100.0
    }

    /// 파라미터 검증
    ///
    /// 범위를 벗어난 값은 보정하지 않고 즉시 실패합니다.
    pub fn validate(&self) -> EngineResult<()> {
        let finite = [
            ("initial_investment", self.initial_investment),
            ("annual_investment", self.annual_investment),
            ("stock_ratio", self.stock_ratio),
            ("bond_ratio", self.bond_ratio),
            ("annual_growth_rate", self.annual_growth_rate),
            ("annual_inflation_rate", self.annual_inflation_rate),
            ("risk_free_rate", self.risk_free_rate),
            ("stock_volatility", self.stock_volatility),
            ("bond_volatility", self.bond_volatility),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(EngineError::Validation(format!("{name} 값이 유한하지 않습니다")));
        }

        if self.initial_investment < 0.0 {
            return Err(EngineError::Validation(
                "초기 투자금은 0 이상이어야 합니다".to_string(),
            ));
        }
        if self.annual_investment < 0.0 {
            return Err(EngineError::Validation(
                "연간 적립 예산은 0 이상이어야 합니다".to_string(),
            ));
        }
        if !(MIN_INVESTMENT_YEARS..=MAX_INVESTMENT_YEARS).contains(&self.investment_years) {
            return Err(EngineError::Validation(format!(
                "투자 연수는 {}~{}년이어야 합니다: {}",
                MIN_INVESTMENT_YEARS, MAX_INVESTMENT_YEARS, self.investment_years
            )));
        }
        if !(0.0..=100.0).contains(&self.stock_ratio) || !(0.0..=100.0).contains(&self.bond_ratio)
        {
            return Err(EngineError::Validation(
                "주식/채권 비중은 0%~100% 사이여야 합니다".to_string(),
            ));
        }
        if (self.stock_ratio + self.bond_ratio - 100.0).abs() > RATIO_TOLERANCE {
            return Err(EngineError::Validation(format!(
                "주식/채권 비중 합계는 100%여야 합니다: {} + {}",
                self.stock_ratio, self.bond_ratio
            )));
        }

        let (growth_min, growth_max) = GROWTH_RATE_RANGE;
        if !(growth_min..=growth_max).contains(&self.annual_growth_rate) {
            return Err(EngineError::InvalidRate {
                name: "annual_growth_rate",
                value: self.annual_growth_rate,
            });
        }
        let (inflation_min, inflation_max) = INFLATION_RATE_RANGE;
        if !(inflation_min..=inflation_max).contains(&self.annual_inflation_rate) {
            return Err(EngineError::InvalidRate {
                name: "annual_inflation_rate",
                value: self.annual_inflation_rate,
            });
        }
        if self.risk_free_rate < 0.0 {
            return Err(EngineError::InvalidRate {
                name: "risk_free_rate",
                value: self.risk_free_rate,
            });
        }
        if self.stock_volatility < 0.0 || self.bond_volatility < 0.0 {
            return Err(EngineError::Validation(
                "변동성은 0 이상이어야 합니다".to_string(),
            ));
        }

        Ok(())
    }
}

/// 기간 단위로 환산된 파라미터.
///
/// 비율은 모두 복리 환산된 소수 값입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodParameters {
    /// 투자 빈도
    pub frequency: Frequency,
    /// 연간 기간 수
    pub periods_per_year: u32,
    /// 총 기간 수
    pub total_periods: u32,
    /// 기간 목표 성장률
    pub period_growth_rate: f64,
    /// 기간 물가상승률
    pub period_inflation_rate: f64,
    /// 기간 주식 변동성
    pub period_stock_volatility: f64,
    /// 기간 채권 변동성
    pub period_bond_volatility: f64,
    /// 기간당 정기 적립 예산 (C_period)
    pub period_contribution: f64,
}

impl PeriodParameters {
    /// 투자 기간 (년)
    pub fn years(&self) -> f64 {
        f64::from(self.total_periods) / f64::from(self.periods_per_year)
    }

    /// 엔진이 요구하는 시장 데이터 포인트 수 (total_periods + 1)
    pub fn required_market_points(&self) -> usize {
        self.total_periods as usize + 1
    }

    /// 정기 적립 예산 설정
    pub fn with_period_contribution(mut self, amount: f64) -> Self {
        self.period_contribution = amount;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_are_valid() {
        let params = SimulationParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.total_periods(), 40);
    }

    #[test]
    fn test_ratio_sum_must_be_100() {
        let mut params = SimulationParameters::default();
        params.stock_ratio = 70.0;
        params.bond_ratio = 40.0;

        let err = params.validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_years_bounds() {
        let params = SimulationParameters::default().with_horizon(0, Frequency::Monthly);
        assert!(params.validate().is_err());

        let params = SimulationParameters::default().with_horizon(41, Frequency::Monthly);
        assert!(params.validate().is_err());

        let params = SimulationParameters::default().with_horizon(40, Frequency::Monthly);
        assert!(params.validate().is_ok());
        assert_eq!(params.total_periods(), 480);
    }

    #[test]
    fn test_rate_bounds() {
        let params = SimulationParameters::default().with_rates(-25.0, 2.0);
        assert!(matches!(
            params.validate(),
            Err(EngineError::InvalidRate {
                name: "annual_growth_rate",
                ..
            })
        ));

        let params = SimulationParameters::default().with_rates(8.0, -1.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_negative_investment_rejected() {
        let params = SimulationParameters::new(-1.0);
        assert!(params.validate().is_err());

        let params = SimulationParameters::new(0.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_stock_ratio_builder() {
        let params = SimulationParameters::default().with_stock_ratio(80.0);
        assert_eq!(params.bond_ratio, 20.0);
        assert!((params.stock_weight() - 0.8).abs() < 1e-12);
    }
}
