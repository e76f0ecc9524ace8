//! 전략 비교 명령어.
//!
//! 시장 데이터 파일로 세 전략(VA_Rebalance, VA_NoSell, DCA)을 실행하고
//! VA 계열 각각을 DCA와 비교합니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 요약 JSON을 stdout으로
//! invest compare -m data/spy_quarterly.json
//!
//! # 원장 CSV와 요약을 디렉토리에 저장
//! invest compare -m data/spy_monthly.csv -f monthly -y 5 -o results/spy
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use invest_analytics::{compare_strategies, ComparisonReport};
use invest_core::{
    Comparison, EngineConfig, MarketDataPoint, SimulationParameters, SummaryRow, TableContract,
};

use super::market::load_market_data;
use super::output::{write_json, write_report_files};
use super::params::SimulationArgs;

/// 비교 명령 설정
#[derive(Debug, Clone)]
pub struct CompareCliConfig {
    /// 시장 데이터 파일 (.json 또는 .csv)
    pub market_path: PathBuf,
    /// 파라미터 오버라이드
    pub simulation: SimulationArgs,
    /// 결과 디렉토리 (없으면 요약 JSON을 stdout으로)
    pub output_dir: Option<PathBuf>,
}

/// stdout용 요약 출력
#[derive(Debug, Serialize)]
pub struct ComparisonOutput<'a> {
    pub parameters: &'a SimulationParameters,
    pub summaries: &'a [SummaryRow],
    pub comparisons: &'a [Comparison],
}

/// 파일 시장 데이터로 비교 실행
pub fn run_compare(config: &EngineConfig, cli: &CompareCliConfig) -> Result<ComparisonReport> {
    let params = cli.simulation.apply(&config.simulation)?;
    let market = load_market_data(&cli.market_path)?;

    run_comparison(config, &params, &market, cli.output_dir.as_deref())
}

/// 세 전략을 실행하고 결과를 출력합니다.
pub(crate) fn run_comparison(
    config: &EngineConfig,
    params: &SimulationParameters,
    market: &[MarketDataPoint],
    output_dir: Option<&Path>,
) -> Result<ComparisonReport> {
    info!(
        frequency = %params.frequency,
        years = params.investment_years,
        points = market.len(),
        "Running strategy comparison"
    );

    let report = compare_strategies(params, market, config.precision, &config.comparison)
        .context("Strategy comparison failed")?;

    match output_dir {
        Some(dir) => {
            let contract = TableContract::new(config.precision);
            let written = write_report_files(&report, dir, &contract)?;
            print_verdicts(&report);
            println!("\n📁 결과 저장됨: {}", dir.display());
            for path in written {
                println!("  - {}", path.display());
            }
        }
        None => {
            let output = ComparisonOutput {
                parameters: params,
                summaries: &report.summaries,
                comparisons: &report.comparisons,
            };
            write_json(&output, None)?;
        }
    }

    Ok(report)
}

fn print_verdicts(report: &ComparisonReport) {
    println!("\n📊 전략 비교 결과");
    for summary in &report.summaries {
        println!(
            "  {:<13} 최종 가치 {:>14}  투입금 {:>14}  연환산 {:>8.2}%  샤프 {:>7.3}",
            summary.strategy.as_str(),
            summary.final_value,
            summary.total_invested,
            summary.annualized_return * 100.0,
            summary.sharpe_ratio,
        );
    }
    for comparison in &report.comparisons {
        println!(
            "  {} vs {}: {} (최종 가치 차이 {}, {:.2}%)",
            comparison.first,
            comparison.second,
            comparison.verdict,
            comparison.final_value_gap,
            comparison.final_value_gap_pct,
        );
    }
}
