//! 테이블 계약.
//!
//! 원장과 요약 테이블의 컬럼 집합, 컬럼별 반올림 자릿수, 원장 불변식 검증을
//! 한 곳에서 정의합니다. 변환기, 지표, 요약기는 모두 같은 [`PrecisionConfig`]를
//! 주입받아 사용합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{StrategyKind, StrategyLedger, StrategyLedgerRow, SummaryRow};
use crate::error::{EngineError, EngineResult};
use crate::types::{round_f64, to_money, DecimalExt};

/// 허용 오차 (부동소수점 누적 오차 흡수용)
const EPSILON: f64 = 1e-9;

/// 반올림 자릿수 설정.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionConfig {
    /// 가격
    #[serde(default = "default_price")]
    pub price: u32,
    /// 수익률(yield) 퍼센트 값
    #[serde(default = "default_yields")]
    pub yields: u32,
    /// 수익률(return) 소수 값
    #[serde(default = "default_returns")]
    pub returns: u32,
    /// 표시용 퍼센트
    #[serde(default = "default_percent")]
    pub percent: u32,
    /// 샤프/소르티노/칼마 비율
    #[serde(default = "default_ratio")]
    pub ratio: u32,
    /// 통화 금액
    #[serde(default = "default_currency")]
    pub currency: u32,
}

fn default_price() -> u32 {
    2
}
fn default_yields() -> u32 {
    4
}
fn default_returns() -> u32 {
    4
}
fn default_percent() -> u32 {
    2
}
fn default_ratio() -> u32 {
    3
}
fn default_currency() -> u32 {
    2
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        Self {
            price: default_price(),
            yields: default_yields(),
            returns: default_returns(),
            percent: default_percent(),
            ratio: default_ratio(),
            currency: default_currency(),
        }
    }
}

/// 컬럼 값의 종류. 반올림 자릿수를 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// 정수 (기간 인덱스)
    Integer,
    /// 날짜
    Date,
    /// 가격
    Price,
    /// 수익률 퍼센트
    Yield,
    /// 소수 수익률
    Return,
    /// 통화 금액
    Currency,
    /// 위험조정 비율
    Ratio,
    /// 문자열 레이블
    Label,
}

/// 컬럼 정의.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// 컬럼 이름
    pub name: &'static str,
    /// 값 종류
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec { name, kind }
}

/// VA 원장 컬럼.
pub const VA_COLUMNS: &[ColumnSpec] = &[
    col("period", ColumnKind::Integer),
    col("date", ColumnKind::Date),
    col("risky_asset_price", ColumnKind::Price),
    col("risk_free_yield", ColumnKind::Yield),
    col("target_value", ColumnKind::Currency),
    col("cash_flow", ColumnKind::Currency),
    col("cumulative_invested", ColumnKind::Currency),
    col("cumulative_withdrawn", ColumnKind::Currency),
    col("stock_value", ColumnKind::Currency),
    col("bond_value", ColumnKind::Currency),
    col("portfolio_value", ColumnKind::Currency),
    col("period_return", ColumnKind::Return),
    col("cumulative_return", ColumnKind::Return),
    col("annualized_return", ColumnKind::Return),
];

/// DCA 원장 컬럼 (목표 가치 없음).
pub const DCA_COLUMNS: &[ColumnSpec] = &[
    col("period", ColumnKind::Integer),
    col("date", ColumnKind::Date),
    col("risky_asset_price", ColumnKind::Price),
    col("risk_free_yield", ColumnKind::Yield),
    col("cash_flow", ColumnKind::Currency),
    col("cumulative_invested", ColumnKind::Currency),
    col("cumulative_withdrawn", ColumnKind::Currency),
    col("stock_value", ColumnKind::Currency),
    col("bond_value", ColumnKind::Currency),
    col("portfolio_value", ColumnKind::Currency),
    col("period_return", ColumnKind::Return),
    col("cumulative_return", ColumnKind::Return),
    col("annualized_return", ColumnKind::Return),
];

/// 요약 테이블 컬럼.
pub const SUMMARY_COLUMNS: &[ColumnSpec] = &[
    col("strategy", ColumnKind::Label),
    col("final_value", ColumnKind::Currency),
    col("total_invested", ColumnKind::Currency),
    col("total_return", ColumnKind::Return),
    col("annualized_return", ColumnKind::Return),
    col("volatility", ColumnKind::Return),
    col("sharpe_ratio", ColumnKind::Ratio),
    col("sortino_ratio", ColumnKind::Ratio),
    col("max_drawdown", ColumnKind::Return),
    col("irr", ColumnKind::Return),
    col("calmar_ratio", ColumnKind::Ratio),
    col("time_weighted_return", ColumnKind::Return),
];

/// 테이블 계약.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableContract {
    precision: PrecisionConfig,
}

impl TableContract {
    /// 주어진 자릿수 설정으로 계약을 생성합니다.
    pub fn new(precision: PrecisionConfig) -> Self {
        Self { precision }
    }

    /// 자릿수 설정
    pub fn precision(&self) -> &PrecisionConfig {
        &self.precision
    }

    /// 전략별 원장 컬럼 집합
    pub fn ledger_columns(kind: StrategyKind) -> &'static [ColumnSpec] {
        if kind.is_value_averaging() {
            VA_COLUMNS
        } else {
            DCA_COLUMNS
        }
    }

    /// 컬럼 종류의 소수점 자릿수. 반올림하지 않는 종류는 None.
    pub fn decimals(&self, kind: ColumnKind) -> Option<u32> {
        match kind {
            ColumnKind::Price => Some(self.precision.price),
            ColumnKind::Yield => Some(self.precision.yields),
            ColumnKind::Return => Some(self.precision.returns),
            ColumnKind::Currency => Some(self.precision.currency),
            ColumnKind::Ratio => Some(self.precision.ratio),
            ColumnKind::Integer | ColumnKind::Date | ColumnKind::Label => None,
        }
    }

    /// 컬럼 종류에 맞게 반올림합니다.
    pub fn round(&self, kind: ColumnKind, value: f64) -> f64 {
        match self.decimals(kind) {
            Some(dp) => round_f64(value, dp),
            None => value,
        }
    }

    /// 퍼센트 표시값 (소수 → %, 2자리)
    pub fn percent(&self, fraction: f64) -> f64 {
        round_f64(fraction * 100.0, self.precision.percent)
    }

    /// 원장 행을 반올림합니다.
    pub fn round_row(&self, row: &StrategyLedgerRow) -> StrategyLedgerRow {
        let currency = |v: f64| self.round(ColumnKind::Currency, v);
        let ret = |v: f64| self.round(ColumnKind::Return, v);

        StrategyLedgerRow {
            period: row.period,
            date: row.date,
            risky_asset_price: self.round(ColumnKind::Price, row.risky_asset_price),
            risk_free_yield: self.round(ColumnKind::Yield, row.risk_free_yield),
            target_value: row.target_value.map(currency),
            cash_flow: currency(row.cash_flow),
            cumulative_invested: currency(row.cumulative_invested),
            cumulative_withdrawn: currency(row.cumulative_withdrawn),
            stock_value: currency(row.stock_value),
            bond_value: currency(row.bond_value),
            portfolio_value: currency(row.portfolio_value),
            period_return: ret(row.period_return),
            cumulative_return: ret(row.cumulative_return),
            annualized_return: ret(row.annualized_return),
        }
    }

    /// 원장 전체를 반올림한 사본을 만듭니다.
    pub fn round_ledger(&self, ledger: &StrategyLedger) -> EngineResult<StrategyLedger> {
        let mut rounded =
            StrategyLedger::with_capacity(ledger.kind, ledger.periods_per_year, ledger.len());
        for row in ledger.rows() {
            rounded.push(self.round_row(row))?;
        }
        Ok(rounded)
    }

    /// 요약 행을 반올림합니다.
    pub fn round_summary(&self, row: &SummaryRow) -> SummaryRow {
        let ret = |v: f64| self.round(ColumnKind::Return, v);
        let ratio = |v: f64| self.round(ColumnKind::Ratio, v);

        SummaryRow {
            strategy: row.strategy,
            final_value: row.final_value.round_half_away(self.precision.currency),
            total_invested: row.total_invested.round_half_away(self.precision.currency),
            total_return: ret(row.total_return),
            annualized_return: ret(row.annualized_return),
            volatility: ret(row.volatility),
            sharpe_ratio: ratio(row.sharpe_ratio),
            sortino_ratio: ratio(row.sortino_ratio),
            max_drawdown: ret(row.max_drawdown),
            irr: ret(row.irr),
            calmar_ratio: ratio(row.calmar_ratio),
            time_weighted_return: ret(row.time_weighted_return),
        }
    }

    /// 통화 금액을 Decimal로 변환합니다.
    pub fn money(&self, value: f64) -> Decimal {
        to_money(value, self.precision.currency)
    }

    /// 원장 불변식을 검증합니다.
    ///
    /// - 기간 인덱스는 0부터 연속
    /// - 누적 투입금은 감소하지 않음
    /// - 매도를 허용하지 않는 전략의 현금흐름은 음수가 아님
    /// - VA 계열은 모든 행에 목표 가치가 있음
    /// - 주식/채권 슬리브는 음수가 아님
    /// - 모든 수치는 유한함
    pub fn validate_ledger(&self, ledger: &StrategyLedger) -> EngineResult<()> {
        let kind = ledger.kind;
        let mut prev_invested = 0.0_f64;

        for (index, row) in ledger.rows().iter().enumerate() {
            if row.period as usize != index {
                return Err(EngineError::Contract(format!(
                    "{kind}: {index}번째 행의 기간 인덱스가 {}입니다",
                    row.period
                )));
            }

            let numbers = [
                row.cash_flow,
                row.cumulative_invested,
                row.cumulative_withdrawn,
                row.stock_value,
                row.bond_value,
                row.portfolio_value,
                row.period_return,
                row.cumulative_return,
                row.annualized_return,
            ];
            if numbers.iter().any(|v| !v.is_finite()) {
                return Err(EngineError::Contract(format!(
                    "{kind}: 기간 {}에 유한하지 않은 값이 있습니다",
                    row.period
                )));
            }

            if row.cumulative_invested + EPSILON < prev_invested {
                return Err(EngineError::Contract(format!(
                    "{kind}: 기간 {}에 누적 투입금이 감소했습니다 ({} → {})",
                    row.period, prev_invested, row.cumulative_invested
                )));
            }
            prev_invested = row.cumulative_invested;

            if !kind.allows_withdrawal() && row.cash_flow < -EPSILON {
                return Err(EngineError::Contract(format!(
                    "{kind}: 기간 {}에 음수 현금흐름 {}",
                    row.period, row.cash_flow
                )));
            }

            let sleeve_tolerance = EPSILON * row.portfolio_value.abs().max(1.0);
            if row.stock_value < -sleeve_tolerance || row.bond_value < -sleeve_tolerance {
                return Err(EngineError::Contract(format!(
                    "{kind}: 기간 {}에 음수 슬리브 (주식 {}, 채권 {})",
                    row.period, row.stock_value, row.bond_value
                )));
            }

            if kind.is_value_averaging() != row.target_value.is_some() {
                return Err(EngineError::Contract(format!(
                    "{kind}: 기간 {}의 목표 가치 컬럼이 전략과 맞지 않습니다",
                    row.period
                )));
            }
        }

        Ok(())
    }

    /// 원장 행을 컬럼 순서대로 문자열 레코드로 변환합니다.
    pub fn ledger_record(&self, kind: StrategyKind, row: &StrategyLedgerRow) -> Vec<String> {
        Self::ledger_columns(kind)
            .iter()
            .map(|spec| match spec.name {
                "period" => row.period.to_string(),
                "date" => row.date.to_string(),
                "target_value" => row
                    .target_value
                    .map(|v| self.format(spec.kind, v))
                    .unwrap_or_default(),
                name => self.format(spec.kind, ledger_number(row, name)),
            })
            .collect()
    }

    /// 요약 행을 컬럼 순서대로 문자열 레코드로 변환합니다.
    pub fn summary_record(&self, row: &SummaryRow) -> Vec<String> {
        SUMMARY_COLUMNS
            .iter()
            .map(|spec| match spec.name {
                "strategy" => row.strategy.to_string(),
                "final_value" => self.format_money(row.final_value),
                "total_invested" => self.format_money(row.total_invested),
                name => self.format(spec.kind, summary_number(row, name)),
            })
            .collect()
    }

    fn format_money(&self, value: Decimal) -> String {
        let dp = self.precision.currency;
        format!("{:.*}", dp as usize, value.round_half_away(dp))
    }

    /// 고정 자릿수 문자열로 포맷합니다. +∞는 "inf".
    pub fn format(&self, kind: ColumnKind, value: f64) -> String {
        if value.is_infinite() {
            return if value > 0.0 { "inf" } else { "-inf" }.to_string();
        }
        match self.decimals(kind) {
            Some(dp) => format!("{:.*}", dp as usize, self.round(kind, value)),
            None => value.to_string(),
        }
    }
}

fn ledger_number(row: &StrategyLedgerRow, name: &str) -> f64 {
    match name {
        "risky_asset_price" => row.risky_asset_price,
        "risk_free_yield" => row.risk_free_yield,
        "cash_flow" => row.cash_flow,
        "cumulative_invested" => row.cumulative_invested,
        "cumulative_withdrawn" => row.cumulative_withdrawn,
        "stock_value" => row.stock_value,
        "bond_value" => row.bond_value,
        "portfolio_value" => row.portfolio_value,
        "period_return" => row.period_return,
        "cumulative_return" => row.cumulative_return,
        "annualized_return" => row.annualized_return,
        _ => f64::NAN,
    }
}

fn summary_number(row: &SummaryRow, name: &str) -> f64 {
    match name {
        "total_return" => row.total_return,
        "annualized_return" => row.annualized_return,
        "volatility" => row.volatility,
        "sharpe_ratio" => row.sharpe_ratio,
        "sortino_ratio" => row.sortino_ratio,
        "max_drawdown" => row.max_drawdown,
        "irr" => row.irr,
        "calmar_ratio" => row.calmar_ratio,
        "time_weighted_return" => row.time_weighted_return,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn row(period: u32, cash_flow: f64, invested: f64, target: Option<f64>) -> StrategyLedgerRow {
        StrategyLedgerRow {
            period,
            date: NaiveDate::from_ymd_opt(2020, 1, 1 + period).unwrap(),
            risky_asset_price: 101.23456,
            risk_free_yield: 2.123456,
            target_value: target,
            cash_flow,
            cumulative_invested: invested,
            cumulative_withdrawn: 0.0,
            stock_value: 600.005,
            bond_value: 400.0,
            portfolio_value: 1000.005,
            period_return: 0.0123456,
            cumulative_return: 0.0,
            annualized_return: 0.0,
        }
    }

    #[test]
    fn test_default_precision() {
        let precision = PrecisionConfig::default();
        assert_eq!(precision.price, 2);
        assert_eq!(precision.yields, 4);
        assert_eq!(precision.returns, 4);
        assert_eq!(precision.percent, 2);
        assert_eq!(precision.ratio, 3);
        assert_eq!(precision.currency, 2);
    }

    #[test]
    fn test_round_row() {
        let contract = TableContract::default();
        let rounded = contract.round_row(&row(0, 1000.0, 1000.0, Some(1000.004)));

        assert_eq!(rounded.risky_asset_price, 101.23);
        assert_eq!(rounded.risk_free_yield, 2.1235);
        assert_eq!(rounded.period_return, 0.0123);
        assert_eq!(rounded.target_value, Some(1000.0));
    }

    #[test]
    fn test_column_sets() {
        assert_eq!(TableContract::ledger_columns(StrategyKind::Dca).len(), 13);
        assert_eq!(TableContract::ledger_columns(StrategyKind::VaNoSell).len(), 14);
        assert!(DCA_COLUMNS.iter().all(|c| c.name != "target_value"));
    }

    #[test]
    fn test_validate_ledger_rejects_negative_dca_flow() {
        let contract = TableContract::default();
        let mut ledger = StrategyLedger::new(StrategyKind::Dca, 12);
        ledger.push(row(0, 1000.0, 1000.0, None)).unwrap();
        ledger.push(row(1, -10.0, 1000.0, None)).unwrap();

        assert!(matches!(
            contract.validate_ledger(&ledger),
            Err(EngineError::Contract(_))
        ));
    }

    #[test]
    fn test_validate_ledger_rebalance_allows_withdrawal() {
        let contract = TableContract::default();
        let mut ledger = StrategyLedger::new(StrategyKind::VaRebalance, 12);
        ledger.push(row(0, 1000.0, 1000.0, Some(1000.0))).unwrap();
        ledger.push(row(1, -10.0, 1000.0, Some(1010.0))).unwrap();
        assert!(contract.validate_ledger(&ledger).is_ok());

        // 목표 가치 누락
        let mut ledger = StrategyLedger::new(StrategyKind::VaNoSell, 12);
        ledger.push(row(0, 1000.0, 1000.0, None)).unwrap();
        assert!(contract.validate_ledger(&ledger).is_err());
    }

    #[test]
    fn test_validate_ledger_rejects_negative_sleeve() {
        let contract = TableContract::default();
        let mut ledger = StrategyLedger::new(StrategyKind::VaRebalance, 1);
        ledger.push(row(0, 1000.0, 1000.0, Some(1000.0))).unwrap();
        let mut overdrawn = row(1, -2200.0, 1000.0, Some(1100.0));
        overdrawn.stock_value = 2800.0;
        overdrawn.bond_value = -1700.0;
        overdrawn.portfolio_value = 1100.0;
        ledger.push(overdrawn).unwrap();

        assert!(matches!(
            contract.validate_ledger(&ledger),
            Err(EngineError::Contract(_))
        ));
    }

    #[test]
    fn test_validate_ledger_rejects_decreasing_invested() {
        let contract = TableContract::default();
        let mut ledger = StrategyLedger::new(StrategyKind::Dca, 12);
        ledger.push(row(0, 1000.0, 1000.0, None)).unwrap();
        ledger.push(row(1, 0.0, 900.0, None)).unwrap();
        assert!(contract.validate_ledger(&ledger).is_err());
    }

    #[test]
    fn test_records() {
        let contract = TableContract::default();
        let record = contract.ledger_record(StrategyKind::Dca, &row(0, 1000.0, 1000.0, None));
        assert_eq!(record[0], "0");
        assert_eq!(record[1], "2020-01-01");
        assert_eq!(record[2], "101.23");
        assert_eq!(record[4], "1000.00");

        let summary = SummaryRow {
            strategy: StrategyKind::Dca,
            final_value: dec!(1234.5),
            total_invested: dec!(1000),
            total_return: 0.2345,
            annualized_return: 0.1,
            volatility: 0.05,
            sharpe_ratio: 1.23456,
            sortino_ratio: f64::INFINITY,
            max_drawdown: -0.1,
            irr: 0.1,
            calmar_ratio: 1.0,
            time_weighted_return: 0.1,
        };
        let record = contract.summary_record(&summary);
        assert_eq!(record[0], "DCA");
        assert_eq!(record[1], "1234.50");
        assert_eq!(record[6], "1.235");
        assert_eq!(record[7], "inf");
    }

    #[test]
    fn test_percent() {
        let contract = TableContract::default();
        assert_eq!(contract.percent(0.123456), 12.35);
    }
}
