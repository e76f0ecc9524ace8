//! 시장 데이터 포인트.
//!
//! 시계열의 t번째 포인트는 기간 t의 종료 시점을 나타내며,
//! 0번째 포인트는 투자 개시 시점입니다.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// 시장 데이터 포인트.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketDataPoint {
    /// 기간 종료일
    pub date: NaiveDate,
    /// 위험자산 가격
    pub risky_asset_price: f64,
    /// 무위험 수익률 (%)
    pub risk_free_yield: f64,
    /// 무위험 자산 가격
    pub risk_free_price: f64,
}

impl MarketDataPoint {
    /// 새 데이터 포인트를 생성합니다.
    pub fn new(
        date: NaiveDate,
        risky_asset_price: f64,
        risk_free_yield: f64,
        risk_free_price: f64,
    ) -> Self {
        Self {
            date,
            risky_asset_price,
            risk_free_yield,
            risk_free_price,
        }
    }

    /// 수익률로부터 무위험 자산 가격을 계산하여 생성합니다.
    ///
    /// 무위험 자산은 만기 1년 무이표채로 가정합니다.
    pub fn from_yield(date: NaiveDate, risky_asset_price: f64, risk_free_yield: f64) -> Self {
        Self::new(
            date,
            risky_asset_price,
            risk_free_yield,
            zero_coupon_price(risk_free_yield),
        )
    }

    /// 포인트 단위 검증
    pub fn validate(&self, period: usize) -> EngineResult<()> {
        if !self.risky_asset_price.is_finite() || self.risky_asset_price < 0.0 {
            return Err(EngineError::InvalidMarketData {
                period,
                reason: format!("위험자산 가격이 음수입니다: {}", self.risky_asset_price),
            });
        }
        if !self.risk_free_price.is_finite() || self.risk_free_price <= 0.0 {
            return Err(EngineError::InvalidMarketData {
                period,
                reason: format!("무위험 자산 가격이 양수가 아닙니다: {}", self.risk_free_price),
            });
        }
        if !self.risk_free_yield.is_finite() || self.risk_free_yield < 0.0 {
            return Err(EngineError::InvalidMarketData {
                period,
                reason: format!("무위험 수익률이 음수입니다: {}", self.risk_free_yield),
            });
        }
        Ok(())
    }
}

/// 1년 만기 무이표채 가격 (액면 100).
///
/// # 계산 공식
/// ```text
/// price = 100 / (1 + yield / 100)
/// ```
pub fn zero_coupon_price(yield_pct: f64) -> f64 {
    100.0 / (1.0 + yield_pct / 100.0)
}

/// 시장 데이터 시계열을 검증하고 실행에 필요한 구간을 반환합니다.
///
/// - 포인트가 `required`개보다 적으면 [`EngineError::MissingMarketData`]
/// - 초과분은 잘라내고 호출자가 경고를 기록할 수 있도록 그대로 둡니다
/// - 날짜는 엄격하게 증가해야 합니다
/// - 위험자산 가격 0은 마지막 포인트에서만 허용합니다 (다음 기간 성장률의 분모)
pub fn validate_series(points: &[MarketDataPoint], required: usize) -> EngineResult<&[MarketDataPoint]> {
    if points.len() < required {
        return Err(EngineError::MissingMarketData {
            required,
            available: points.len(),
        });
    }

    let window = &points[..required];
    for (period, point) in window.iter().enumerate() {
        point.validate(period)?;
        if period + 1 < window.len() && point.risky_asset_price == 0.0 {
            return Err(EngineError::InvalidMarketData {
                period,
                reason: "다음 기간 성장률 계산에 쓰이는 위험자산 가격이 0입니다".to_string(),
            });
        }
    }
    for (offset, pair) in window.windows(2).enumerate() {
        if pair[1].date <= pair[0].date {
            return Err(EngineError::InvalidMarketData {
                period: offset + 1,
                reason: format!("날짜가 증가하지 않습니다: {} → {}", pair[0].date, pair[1].date),
            });
        }
    }

    Ok(window)
}
