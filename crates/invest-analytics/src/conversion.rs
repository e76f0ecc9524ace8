//! 연 단위 파라미터를 기간 단위로 환산합니다.
//!
//! # 계산 공식
//!
//! ```text
//! period_rate = (1 + annual_rate)^(1 / periods_per_year) − 1
//! period_vol  = annual_vol / sqrt(periods_per_year)
//! ```
//!
//! 환산한 기간 수익률을 `periods_per_year`번 복리로 되돌리면 원래 연 수익률이
//! 1e-6 이내로 재현됩니다.

use invest_core::{
    EngineError, EngineResult, Frequency, PeriodParameters, SimulationParameters,
    MAX_INVESTMENT_YEARS, MIN_INVESTMENT_YEARS,
};
use tracing::debug;

/// 파라미터 변환기.
///
/// 투자 기간(년)을 생성 시점에 고정하므로 변환 결과의 총 기간 수가 항상 정의됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterConverter {
    investment_years: u32,
}

impl ParameterConverter {
    /// 투자 기간으로 변환기를 생성합니다.
    pub fn new(investment_years: u32) -> EngineResult<Self> {
        if !(MIN_INVESTMENT_YEARS..=MAX_INVESTMENT_YEARS).contains(&investment_years) {
            return Err(EngineError::Validation(format!(
                "투자 연수는 {}~{}년이어야 합니다: {}",
                MIN_INVESTMENT_YEARS, MAX_INVESTMENT_YEARS, investment_years
            )));
        }
        Ok(Self { investment_years })
    }

    /// 투자 연수
    pub fn investment_years(&self) -> u32 {
        self.investment_years
    }

    /// 연 단위 비율(퍼센트)을 기간 단위 파라미터로 환산합니다.
    ///
    /// 적립 예산(`period_contribution`)은 0으로 설정됩니다.
    /// 시뮬레이션 파라미터 전체를 환산하려면 [`ParameterConverter::convert_parameters`]를 사용합니다.
    pub fn convert(
        &self,
        frequency: Frequency,
        annual_growth_rate: f64,
        annual_inflation_rate: f64,
        annual_stock_volatility: f64,
        annual_bond_volatility: f64,
    ) -> EngineResult<PeriodParameters> {
        let periods_per_year = frequency.periods_per_year();

        let period_growth_rate =
            Self::period_rate("annual_growth_rate", annual_growth_rate, periods_per_year)?;
        let period_inflation_rate =
            Self::period_rate("annual_inflation_rate", annual_inflation_rate, periods_per_year)?;
        let period_stock_volatility =
            Self::period_volatility("stock_volatility", annual_stock_volatility, periods_per_year)?;
        let period_bond_volatility =
            Self::period_volatility("bond_volatility", annual_bond_volatility, periods_per_year)?;

        let params = PeriodParameters {
            frequency,
            periods_per_year,
            total_periods: self.investment_years * periods_per_year,
            period_growth_rate,
            period_inflation_rate,
            period_stock_volatility,
            period_bond_volatility,
            period_contribution: 0.0,
        };

        debug!(
            frequency = %frequency,
            total_periods = params.total_periods,
            period_growth_rate,
            period_inflation_rate,
            "Converted annual parameters"
        );

        Ok(params)
    }

    /// 빈도 문자열을 받아 환산합니다.
    pub fn convert_str(
        &self,
        frequency: &str,
        annual_growth_rate: f64,
        annual_inflation_rate: f64,
        annual_stock_volatility: f64,
        annual_bond_volatility: f64,
    ) -> EngineResult<PeriodParameters> {
        let frequency: Frequency = frequency.parse()?;
        self.convert(
            frequency,
            annual_growth_rate,
            annual_inflation_rate,
            annual_stock_volatility,
            annual_bond_volatility,
        )
    }

    /// 검증된 시뮬레이션 파라미터 전체를 환산합니다.
    pub fn convert_parameters(params: &SimulationParameters) -> EngineResult<PeriodParameters> {
        params.validate()?;
        let converter = Self::new(params.investment_years)?;
        let period = converter.convert(
            params.frequency,
            params.annual_growth_rate,
            params.annual_inflation_rate,
            params.stock_volatility,
            params.bond_volatility,
        )?;

        let contribution = params.annual_investment / f64::from(period.periods_per_year);
        Ok(period.with_period_contribution(contribution))
    }

    /// 기간 수익률을 연 수익률(퍼센트)로 되돌립니다.
    pub fn annualize_period_rate(period_rate: f64, periods_per_year: u32) -> f64 {
        ((1.0 + period_rate).powi(periods_per_year as i32) - 1.0) * 100.0
    }

    fn period_rate(name: &'static str, annual_pct: f64, periods_per_year: u32) -> EngineResult<f64> {
        let annual = annual_pct / 100.0;
        if !annual.is_finite() || annual <= -1.0 {
            return Err(EngineError::InvalidRate {
                name,
                value: annual_pct,
            });
        }
        Ok((1.0 + annual).powf(1.0 / f64::from(periods_per_year)) - 1.0)
    }

    fn period_volatility(
        name: &'static str,
        annual_pct: f64,
        periods_per_year: u32,
    ) -> EngineResult<f64> {
        if !annual_pct.is_finite() || annual_pct < 0.0 {
            return Err(EngineError::InvalidRate {
                name,
                value: annual_pct,
            });
        }
        Ok(annual_pct / 100.0 / f64::from(periods_per_year).sqrt())
    }
}
