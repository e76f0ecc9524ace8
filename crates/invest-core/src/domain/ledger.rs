//! 전략 원장.
//!
//! 원장은 기간 0부터 total_periods까지 순서대로 쌓이는 행의 목록입니다.
//! 한 번 추가된 행은 수정할 수 없습니다.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// 전략 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// 가치 평균법 (목표 초과 시 매도 허용)
    #[serde(rename = "VA_Rebalance")]
    VaRebalance,
    /// 가치 평균법 (매도 없음)
    #[serde(rename = "VA_NoSell")]
    VaNoSell,
    /// 정액 적립식
    #[serde(rename = "DCA")]
    Dca,
}

impl StrategyKind {
    /// 모든 전략 종류.
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::VaRebalance,
        StrategyKind::VaNoSell,
        StrategyKind::Dca,
    ];

    /// 식별자 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::VaRebalance => "VA_Rebalance",
            StrategyKind::VaNoSell => "VA_NoSell",
            StrategyKind::Dca => "DCA",
        }
    }

    /// 가치 평균법 계열 여부
    pub fn is_value_averaging(&self) -> bool {
        matches!(self, StrategyKind::VaRebalance | StrategyKind::VaNoSell)
    }

    /// 음수 현금흐름(인출) 허용 여부
    pub fn allows_withdrawal(&self) -> bool {
        matches!(self, StrategyKind::VaRebalance)
    }

    /// 기간 시작 시점 투자 여부 (DCA).
    ///
    /// 기간 t(t ≥ 1)의 적립금은 t−1 시점에 실행됩니다.
    pub fn invests_at_period_start(&self) -> bool {
        matches!(self, StrategyKind::Dca)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "va_rebalance" | "va" | "rebalance" => Ok(StrategyKind::VaRebalance),
            "va_nosell" | "va_no_sell" | "nosell" | "no_sell" => Ok(StrategyKind::VaNoSell),
            "dca" => Ok(StrategyKind::Dca),
            _ => Err(EngineError::Validation(format!("알 수 없는 전략: {s}"))),
        }
    }
}

/// 원장의 한 행 (한 기간).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyLedgerRow {
    /// 기간 인덱스 (0..=total_periods)
    pub period: u32,
    /// 기간 종료일
    pub date: NaiveDate,
    /// 위험자산 가격
    pub risky_asset_price: f64,
    /// 무위험 수익률 (%)
    pub risk_free_yield: f64,
    /// VA 목표 가치 (DCA는 None)
    pub target_value: Option<f64>,
    /// 이번 기간 현금흐름 (양수 투입, 음수 인출)
    pub cash_flow: f64,
    /// 누적 투입금 (양수 현금흐름의 합)
    pub cumulative_invested: f64,
    /// 누적 인출금 (음수 현금흐름 절대값의 합)
    pub cumulative_withdrawn: f64,
    /// 주식 슬리브 가치
    pub stock_value: f64,
    /// 채권 슬리브 가치
    pub bond_value: f64,
    /// 포트폴리오 가치
    pub portfolio_value: f64,
    /// 현금흐름 조정 기간 수익률
    pub period_return: f64,
    /// 누적 수익률 (value / invested − 1)
    pub cumulative_return: f64,
    /// 연환산 누적 수익률
    pub annualized_return: f64,
}

/// 전략 원장.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyLedger {
    /// 전략 종류
    pub kind: StrategyKind,
    /// 연간 기간 수
    pub periods_per_year: u32,
    rows: Vec<StrategyLedgerRow>,
}

impl StrategyLedger {
    /// 빈 원장을 생성합니다.
    pub fn new(kind: StrategyKind, periods_per_year: u32) -> Self {
        Self {
            kind,
            periods_per_year,
            rows: Vec::new(),
        }
    }

    /// 행 용량을 미리 확보한 빈 원장을 생성합니다.
    pub fn with_capacity(kind: StrategyKind, periods_per_year: u32, capacity: usize) -> Self {
        Self {
            kind,
            periods_per_year,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// 다음 기간의 행을 추가합니다.
    ///
    /// 행의 기간 인덱스는 현재 행 수와 같아야 합니다.
    pub fn push(&mut self, row: StrategyLedgerRow) -> EngineResult<()> {
        let expected = self.rows.len() as u32;
        if row.period != expected {
            return Err(EngineError::Contract(format!(
                "{} 원장: 기간 {} 위치에 기간 {} 행을 추가할 수 없습니다",
                self.kind, expected, row.period
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// 모든 행
    pub fn rows(&self) -> &[StrategyLedgerRow] {
        &self.rows
    }

    /// 행 수
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 마지막 행
    pub fn last(&self) -> Option<&StrategyLedgerRow> {
        self.rows.last()
    }

    /// 총 기간 수 (마지막 행의 기간 인덱스)
    pub fn total_periods(&self) -> u32 {
        self.rows.last().map(|r| r.period).unwrap_or(0)
    }

    /// 투자 기간 (년)
    pub fn years(&self) -> f64 {
        if self.periods_per_year == 0 {
            return 0.0;
        }
        f64::from(self.total_periods()) / f64::from(self.periods_per_year)
    }

    /// 최종 포트폴리오 가치
    pub fn final_value(&self) -> f64 {
        self.rows.last().map(|r| r.portfolio_value).unwrap_or(0.0)
    }

    /// 총 투입금
    pub fn total_invested(&self) -> f64 {
        self.rows.last().map(|r| r.cumulative_invested).unwrap_or(0.0)
    }

    /// 포트폴리오 가치 시계열
    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.portfolio_value).collect()
    }

    /// 기간 수익률 시계열 (기간 1부터)
    pub fn period_returns(&self) -> Vec<f64> {
        self.rows.iter().skip(1).map(|r| r.period_return).collect()
    }

    /// 날짜 시계열
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// 투자자 관점 현금흐름 (IRR 입력).
    ///
    /// `dates()`와 같은 길이이며 i번째 값은 i번째 날짜에 발생합니다.
    /// 각 기간 −cash_flow, 마지막 날짜에는 최종 가치를 더합니다.
    /// 기간 시작 시점에 투자하는 전략은 기간 t(t ≥ 1)의 적립금을 t−1 날짜에 둡니다.
    pub fn investor_cash_flows(&self) -> Vec<f64> {
        let mut flows = vec![0.0; self.rows.len()];
        let shift = self.kind.invests_at_period_start();
        for (i, row) in self.rows.iter().enumerate() {
            let index = if shift { i.saturating_sub(1) } else { i };
            flows[index] -= row.cash_flow;
        }
        if let Some(last) = flows.last_mut() {
            *last += self.final_value();
        }
        flows
    }

    /// 행을 소유권과 함께 반환합니다.
    pub fn into_rows(self) -> Vec<StrategyLedgerRow> {
        self.rows
    }
}
