//! 시장 데이터 파일 로드.
//!
//! JSON 배열 또는 헤더가 있는 CSV를 지원합니다. 두 형식 모두
//! `date, risky_asset_price, risk_free_yield[, risk_free_price]` 필드를 사용하며,
//! 무위험 자산 가격이 없으면 수익률로부터 계산합니다.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use invest_core::MarketDataPoint;

/// 파일 한 행.
#[derive(Debug, Deserialize)]
struct MarketRow {
    date: NaiveDate,
    risky_asset_price: f64,
    risk_free_yield: f64,
    #[serde(default)]
    risk_free_price: Option<f64>,
}

impl From<MarketRow> for MarketDataPoint {
    fn from(row: MarketRow) -> Self {
        match row.risk_free_price {
            Some(price) => {
                MarketDataPoint::new(row.date, row.risky_asset_price, row.risk_free_yield, price)
            }
            None => MarketDataPoint::from_yield(row.date, row.risky_asset_price, row.risk_free_yield),
        }
    }
}

/// 입력 파일 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketFormat {
    Json,
    Csv,
}

impl MarketFormat {
    /// 확장자로 형식을 판별합니다.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => bail!(
                "Unsupported market data file: {}. Use .json or .csv",
                path.display()
            ),
        }
    }
}

/// 파일에서 시장 데이터를 읽습니다.
pub fn load_market_data(path: &Path) -> Result<Vec<MarketDataPoint>> {
    let format = MarketFormat::from_path(path)?;
    let file = File::open(path)
        .with_context(|| format!("Failed to open market data: {}", path.display()))?;

    let points = parse_market_data(file, format)
        .with_context(|| format!("Failed to parse market data: {}", path.display()))?;

    info!(path = %path.display(), points = points.len(), "Market data loaded");
    Ok(points)
}

/// 리더에서 시장 데이터를 파싱합니다.
pub fn parse_market_data<R: Read>(reader: R, format: MarketFormat) -> Result<Vec<MarketDataPoint>> {
    let rows: Vec<MarketRow> = match format {
        MarketFormat::Json => serde_json::from_reader(reader)?,
        MarketFormat::Csv => {
            let mut csv_reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .trim(csv::Trim::All)
                .from_reader(reader);
            csv_reader
                .deserialize()
                .collect::<std::result::Result<Vec<MarketRow>, _>>()?
        }
    };

    Ok(rows.into_iter().map(MarketDataPoint::from).collect())
}
