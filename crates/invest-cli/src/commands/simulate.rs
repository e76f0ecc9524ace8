//! 합성 시장 시뮬레이션 명령어.
//!
//! 시드 고정 합성 시장 데이터를 생성한 뒤 전략 비교를 실행합니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 설정 파일의 시드로 실행
//! invest simulate
//!
//! # 시드 변경, 생성된 시장 데이터도 저장
//! invest simulate --seed 7 --save-market data/synthetic.json -o results/seed7
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use invest_analytics::{ComparisonReport, ParameterConverter, SyntheticMarketGenerator};
use invest_core::EngineConfig;

use super::compare::run_comparison;
use super::output::write_json;
use super::params::SimulationArgs;

/// 시뮬레이션 명령 설정
#[derive(Debug, Clone)]
pub struct SimulateCliConfig {
    /// 파라미터 오버라이드
    pub simulation: SimulationArgs,
    /// 난수 시드 (없으면 설정값)
    pub seed: Option<u64>,
    /// 생성한 시장 데이터 저장 경로
    pub save_market: Option<PathBuf>,
    /// 결과 디렉토리
    pub output_dir: Option<PathBuf>,
}

/// 합성 시장으로 비교 실행
pub fn run_simulate(config: &EngineConfig, cli: &SimulateCliConfig) -> Result<ComparisonReport> {
    let params = cli.simulation.apply(&config.simulation)?;
    let period = ParameterConverter::convert_parameters(&params)
        .context("Failed to convert simulation parameters")?;

    let mut generator =
        SyntheticMarketGenerator::new(config.synthetic.clone()).with_precision(config.precision);
    if let Some(seed) = cli.seed {
        generator = generator.with_seed(seed);
    }

    let market = generator
        .generate(&period)
        .context("Failed to generate synthetic market data")?;
    info!(
        seed = generator.config().seed,
        points = market.len(),
        "Synthetic market generated"
    );

    if let Some(path) = &cli.save_market {
        write_json(&market, Some(path))?;
    }

    run_comparison(config, &params, &market, cli.output_dir.as_deref())
}
