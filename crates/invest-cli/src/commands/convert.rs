//! 파라미터 환산 명령어.
//!
//! 연 단위 시뮬레이션 파라미터를 기간 단위로 환산하여 JSON으로 출력합니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 기본 설정 (10년, 분기)
//! invest convert
//!
//! # 20년 월별, 연 6% 성장
//! invest convert -y 20 -f monthly -g 6
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use invest_analytics::ParameterConverter;
use invest_core::{EngineConfig, PeriodParameters};

use super::output::write_json;
use super::params::SimulationArgs;

/// 환산 명령 설정
#[derive(Debug, Clone)]
pub struct ConvertCliConfig {
    /// 파라미터 오버라이드
    pub simulation: SimulationArgs,
    /// 결과 저장 경로 (없으면 stdout)
    pub output_path: Option<PathBuf>,
}

/// 파라미터 환산 실행
pub fn run_convert(config: &EngineConfig, cli: &ConvertCliConfig) -> Result<PeriodParameters> {
    let params = cli.simulation.apply(&config.simulation)?;
    let period = ParameterConverter::convert_parameters(&params)
        .context("Failed to convert simulation parameters")?;

    info!(
        frequency = %period.frequency,
        total_periods = period.total_periods,
        period_growth_rate = period.period_growth_rate,
        "Parameters converted"
    );

    write_json(&period, cli.output_path.as_deref())?;
    Ok(period)
}
