//! 합성 시장 데이터 생성기.
//!
//! 외부 시장 데이터를 사용할 수 없을 때 쓰는 시드 고정 시계열입니다.
//! 같은 시드와 파라미터는 항상 같은 시계열을 만듭니다.
//!
//! - 위험자산: 기하 브라운 운동 (기간 성장률을 로그 드리프트로, 기간 변동성을 확산 계수로 사용)
//! - 무위험 수익률: 장기 평균으로 회귀하는 랜덤 워크, [0, 15]% 범위로 제한

use chrono::{Months, NaiveDate};
use invest_core::{
    round_f64, EngineError, EngineResult, MarketDataPoint, PeriodParameters, PrecisionConfig,
    SyntheticMarketConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

/// 무위험 수익률 상한 (%)
const MAX_SYNTHETIC_YIELD: f64 = 15.0;

/// 반올림 후 허용하는 최소 가격
const MIN_SYNTHETIC_PRICE: f64 = 0.01;

/// 합성 시장 데이터 생성기.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticMarketGenerator {
    config: SyntheticMarketConfig,
    precision: PrecisionConfig,
}

impl SyntheticMarketGenerator {
    /// 설정으로 생성기를 만듭니다.
    pub fn new(config: SyntheticMarketConfig) -> Self {
        Self {
            config,
            precision: PrecisionConfig::default(),
        }
    }

    /// 시드를 변경합니다.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// 반올림 자릿수를 설정합니다.
    pub fn with_precision(mut self, precision: PrecisionConfig) -> Self {
        self.precision = precision;
        self
    }

    /// 설정
    pub fn config(&self) -> &SyntheticMarketConfig {
        &self.config
    }

    /// `total_periods + 1`개의 데이터 포인트를 생성합니다.
    ///
    /// # 계산 공식
    ///
    /// ```text
    /// S_t = S_{t−1} × exp(ln(1 + g) − σ²/2 + σ × Z)
    /// y_t = clamp(y_{t−1} + κ(ȳ − y_{t−1}) + σ_y / sqrt(periods_per_year) × Z', 0, 15)
    /// ```
    pub fn generate(&self, period: &PeriodParameters) -> EngineResult<Vec<MarketDataPoint>> {
        let config = &self.config;
        if !(config.initial_price.is_finite() && config.initial_price > 0.0) {
            return Err(EngineError::Config(format!(
                "합성 시장 데이터의 초기 가격이 양수가 아닙니다: {}",
                config.initial_price
            )));
        }

        let points = period.required_market_points();
        let months_per_period = period.frequency.months_per_period();
        let drift = (1.0 + period.period_growth_rate).ln();
        let sigma = period.period_stock_volatility;
        let yield_sigma = config.yield_volatility / f64::from(period.periods_per_year).sqrt();

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut price = config.initial_price;
        let mut yield_pct = config.initial_yield.clamp(0.0, MAX_SYNTHETIC_YIELD);
        let mut series = Vec::with_capacity(points);

        for index in 0..points {
            if index > 0 {
                let z: f64 = StandardNormal.sample(&mut rng);
                price *= (drift - 0.5 * sigma * sigma + sigma * z).exp();

                let z_yield: f64 = StandardNormal.sample(&mut rng);
                yield_pct += config.mean_reversion * (config.long_term_yield - yield_pct)
                    + yield_sigma * z_yield;
                yield_pct = yield_pct.clamp(0.0, MAX_SYNTHETIC_YIELD);
            }

            let date = period_date(config.start_date, months_per_period * index as u32)?;
            let rounded_price = round_f64(price, self.precision.price).max(MIN_SYNTHETIC_PRICE);
            let rounded_yield = round_f64(yield_pct, self.precision.yields);
            series.push(MarketDataPoint::from_yield(date, rounded_price, rounded_yield));
        }

        debug!(
            seed = config.seed,
            points = series.len(),
            final_price = price,
            "Synthetic market series generated"
        );

        Ok(series)
    }
}

fn period_date(start: NaiveDate, months: u32) -> EngineResult<NaiveDate> {
    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| EngineError::Config(format!("날짜 범위를 벗어났습니다: {start} + {months}개월")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::ParameterConverter;
    use invest_core::{validate_series, Frequency, SimulationParameters};

    fn period(years: u32, frequency: Frequency) -> PeriodParameters {
        let params = SimulationParameters::default().with_horizon(years, frequency);
        ParameterConverter::convert_parameters(&params).unwrap()
    }

    #[test]
    fn test_series_shape() {
        let period = period(5, Frequency::Quarterly);
        let series = SyntheticMarketGenerator::new(SyntheticMarketConfig::default())
            .generate(&period)
            .unwrap();

        assert_eq!(series.len(), 21);
        assert_eq!(series[0].risky_asset_price, 400.0);
        assert_eq!(series[0].risk_free_yield, 4.0);
        assert_eq!(series[1].date, NaiveDate::from_ymd_opt(2020, 4, 1).unwrap());
        assert!(validate_series(&series, 21).is_ok());
    }

    #[test]
    fn test_seed_is_deterministic() {
        let period = period(3, Frequency::Monthly);
        let generator = SyntheticMarketGenerator::new(SyntheticMarketConfig::default());

        let first = generator.generate(&period).unwrap();
        let second = generator.generate(&period).unwrap();
        assert_eq!(first, second);

        let other = generator.clone().with_seed(7).generate(&period).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_yield_stays_in_bounds() {
        let period = period(40, Frequency::Monthly);
        let config = SyntheticMarketConfig {
            initial_yield: 0.1,
            long_term_yield: 0.1,
            yield_volatility: 5.0,
            ..Default::default()
        };
        let series = SyntheticMarketGenerator::new(config).generate(&period).unwrap();

        assert_eq!(series.len(), 481);
        assert!(series
            .iter()
            .all(|p| (0.0..=MAX_SYNTHETIC_YIELD).contains(&p.risk_free_yield)));
        assert!(series.iter().all(|p| p.risky_asset_price > 0.0));
    }
}
