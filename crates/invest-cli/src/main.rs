//! VA / DCA 전략 비교 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 기간 파라미터 확인
//! invest convert -y 10 -f quarterly
//!
//! # 시장 데이터 파일로 세 전략 비교
//! invest compare -m data/spy_quarterly.json -o results/spy
//!
//! # 합성 시장 데이터로 비교
//! invest simulate --seed 42
//!
//! # JSON 로그, 다른 설정 파일
//! invest --config config/aggressive.toml --log-format json simulate
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use invest_cli::commands::compare::{run_compare, CompareCliConfig};
use invest_cli::commands::convert::{run_convert, ConvertCliConfig};
use invest_cli::commands::params::SimulationArgs;
use invest_cli::commands::simulate::{run_simulate, SimulateCliConfig};
use invest_core::{init_logging, EngineConfig, LogConfig, LogFormat};

#[derive(Parser)]
#[command(name = "invest")]
#[command(about = "VA / DCA 투자 전략 비교 엔진", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (기본: config/default.toml, 없으면 환경 변수만 사용)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 로그 형식 (pretty, json, compact). 설정 파일 값보다 우선
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 연 단위 파라미터를 기간 단위로 환산
    Convert {
        #[command(flatten)]
        simulation: SimulationArgs,

        /// 결과 저장 경로 (지정하지 않으면 stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 시장 데이터 파일로 전략 비교
    Compare {
        /// 시장 데이터 파일 (.json 또는 .csv)
        #[arg(short, long)]
        market: PathBuf,

        #[command(flatten)]
        simulation: SimulationArgs,

        /// 결과 디렉토리 (원장 CSV, summary.csv, report.json)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// 합성 시장 데이터로 전략 비교
    Simulate {
        #[command(flatten)]
        simulation: SimulationArgs,

        /// 난수 시드
        #[arg(long)]
        seed: Option<u64>,

        /// 생성한 시장 데이터를 JSON으로 저장
        #[arg(long)]
        save_market: Option<PathBuf>,

        /// 결과 디렉토리 (원장 CSV, summary.csv, report.json)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => EngineConfig::load_default().context("Failed to load default config"),
    }
}

fn main() -> Result<()> {
    // .env 파일은 선택 사항
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let mut log_config = LogConfig::from(&config.logging);
    if let Some(format) = &cli.log_format {
        log_config = log_config.with_format(
            format
                .parse::<LogFormat>()
                .map_err(|e| anyhow::anyhow!("Invalid log format {}: {}", format, e))?,
        );
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    info!(
        frequency = %config.simulation.frequency,
        years = config.simulation.investment_years,
        "Configuration loaded"
    );

    let result = match cli.command {
        Commands::Convert { simulation, output } => run_convert(
            &config,
            &ConvertCliConfig {
                simulation,
                output_path: output,
            },
        )
        .map(|_| ()),

        Commands::Compare {
            market,
            simulation,
            output_dir,
        } => run_compare(
            &config,
            &CompareCliConfig {
                market_path: market,
                simulation,
                output_dir,
            },
        )
        .map(|_| ()),

        Commands::Simulate {
            simulation,
            seed,
            save_market,
            output_dir,
        } => run_simulate(
            &config,
            &SimulateCliConfig {
                simulation,
                seed,
                save_market,
                output_dir,
            },
        )
        .map(|_| ()),
    };

    if let Err(e) = &result {
        error!("Command failed: {:#}", e);
    }
    result
}
