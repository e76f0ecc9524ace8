//! 전략 요약과 비교 결과.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ledger::StrategyKind;
use crate::types::Money;

/// 전략별 성과 요약.
///
/// 비율 지표는 소수 단위이며 반올림 계약이 적용된 값입니다.
/// 음수 초과수익이 없는 경우 `sortino_ratio`는 +∞이며 JSON에서는 `null`로 기록됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// 전략
    pub strategy: StrategyKind,
    /// 최종 가치
    pub final_value: Money,
    /// 총 투입금
    pub total_invested: Money,
    /// 총 수익률
    pub total_return: f64,
    /// 연환산 수익률
    pub annualized_return: f64,
    /// 변동성
    pub volatility: f64,
    /// 샤프 비율
    pub sharpe_ratio: f64,
    /// 소르티노 비율
    #[serde(with = "infinity_as_null")]
    pub sortino_ratio: f64,
    /// 최대 낙폭 (0 이하)
    pub max_drawdown: f64,
    /// 내부수익률 (연)
    pub irr: f64,
    /// 칼마 비율
    pub calmar_ratio: f64,
    /// 시간가중수익률 (연)
    pub time_weighted_return: f64,
}

/// +∞를 JSON `null`로 기록하고, `null`을 +∞로 읽습니다.
mod infinity_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// 비교 판정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "strategy", rename_all = "snake_case")]
pub enum Verdict {
    /// 해당 전략이 우세
    Favors(StrategyKind),
    /// 우열 없음
    NoClearWinner,
}

impl Verdict {
    /// 우세 전략 (우열 없음이면 None)
    pub fn winner(&self) -> Option<StrategyKind> {
        match self {
            Verdict::Favors(kind) => Some(*kind),
            Verdict::NoClearWinner => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Favors(kind) => write!(f, "{}", kind),
            Verdict::NoClearWinner => f.write_str("no clear winner"),
        }
    }
}

/// 두 전략(A, B)의 비교 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// 전략 A
    pub first: StrategyKind,
    /// 전략 B
    pub second: StrategyKind,
    /// 샤프 비율이 더 높은 전략
    pub higher_sharpe: Verdict,
    /// 최종 가치 차이 (A − B)
    pub final_value_gap: Money,
    /// 최종 가치 차이 (B 대비 %)
    pub final_value_gap_pct: f64,
    /// 연환산 수익률 차이 (A − B, 소수)
    pub annualized_return_gap: f64,
    /// 종합 판정 (연환산 수익률 차이 기준)
    pub verdict: Verdict,
}

/// 두 원장의 요약 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    /// 전략 A 요약
    pub first: SummaryRow,
    /// 전략 B 요약
    pub second: SummaryRow,
    /// 비교 결과
    pub comparison: Comparison,
}

impl SummaryReport {
    /// `(A, B, 비교)` 튜플로 분해합니다.
    pub fn into_parts(self) -> (SummaryRow, SummaryRow, Comparison) {
        (self.first, self.second, self.comparison)
    }
}
