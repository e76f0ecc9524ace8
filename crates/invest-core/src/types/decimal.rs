//! 반올림 계약을 위한 Decimal 유틸리티.
//!
//! 엔진 내부 계산은 `f64`로 수행하고, 외부로 내보내는 값의 자릿수 처리는
//! `rust_decimal`의 중간값 올림(MidpointAwayFromZero) 규칙을 따릅니다.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// 통화 금액 타입.
pub type Money = Decimal;

/// `f64` 값을 지정된 소수점 자릿수로 반올림합니다.
///
/// 무한대와 NaN은 그대로 반환합니다 (Sortino의 +∞ 센티널 보존).
pub fn round_f64(value: f64, dp: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// `f64` 금액을 지정된 자릿수의 `Decimal`로 변환합니다.
///
/// 유한하지 않은 값은 0으로 처리합니다.
pub fn to_money(value: f64, dp: u32) -> Money {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or(Decimal::ZERO)
}

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 퍼센트 문자열로 변환합니다 (예: 0.0525 → "5.25%").
    fn to_percentage_string(&self) -> String;

    /// 중간값 올림 규칙으로 반올림합니다.
    fn round_half_away(&self, dp: u32) -> Decimal;
}

impl DecimalExt for Decimal {
    fn to_percentage_string(&self) -> String {
        let pct = (*self * Decimal::ONE_HUNDRED).round_half_away(2);
        format!("{:.2}%", pct)
    }

    fn round_half_away(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
    }
}
