//! 설정 관리.
//!
//! TOML 파일과 `INVEST__` 접두사 환경 변수에서 엔진 설정을 로드합니다.
//! 모든 섹션은 기본값을 가지므로 빈 파일로도 동작합니다.
//!
//! ```text
//! INVEST__SIMULATION__INVESTMENT_YEARS=20
//! INVEST__COMPARISON__TIE_THRESHOLD=0.005
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::SimulationParameters;
use crate::error::{EngineError, EngineResult};
use crate::table::PrecisionConfig;

/// 환경 변수 접두사
pub const ENV_PREFIX: &str = "INVEST";

/// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 엔진 설정.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// 기본 시뮬레이션 파라미터
    #[serde(default)]
    pub simulation: SimulationParameters,
    /// 반올림 자릿수
    #[serde(default)]
    pub precision: PrecisionConfig,
    /// 전략 비교 설정
    #[serde(default)]
    pub comparison: ComparisonConfig,
    /// 합성 시장 데이터 설정
    #[serde(default)]
    pub synthetic: SyntheticMarketConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 전략 비교 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComparisonConfig {
    /// 연환산 수익률 차이가 이 값(소수) 미만이면 "우열 없음"
    #[serde(default = "default_tie_threshold")]
    pub tie_threshold: f64,
}

fn default_tie_threshold() -> f64 {
    0.001
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            tie_threshold: default_tie_threshold(),
        }
    }
}

/// 합성 시장 데이터 설정.
///
/// 외부 시장 데이터가 없을 때 사용하는 시드 고정 생성기의 파라미터입니다.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SyntheticMarketConfig {
    /// 난수 시드
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// 첫 데이터 포인트 날짜
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    /// 위험자산 초기 가격
    #[serde(default = "default_initial_price")]
    pub initial_price: f64,
    /// 초기 무위험 수익률 (%)
    #[serde(default = "default_initial_yield")]
    pub initial_yield: f64,
    /// 장기 평균 수익률 (%)
    #[serde(default = "default_initial_yield")]
    pub long_term_yield: f64,
    /// 기간당 평균 회귀 속도 (0~1)
    #[serde(default = "default_mean_reversion")]
    pub mean_reversion: f64,
    /// 수익률 연 변동폭 (%p)
    #[serde(default = "default_yield_volatility")]
    pub yield_volatility: f64,
}

fn default_seed() -> u64 {
    42
}
fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}
fn default_initial_price() -> f64 {
    400.0
}
fn default_initial_yield() -> f64 {
    4.0
}
fn default_mean_reversion() -> f64 {
    0.1
}
fn default_yield_volatility() -> f64 {
    1.0
}

impl Default for SyntheticMarketConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            start_date: default_start_date(),
            initial_price: default_initial_price(),
            initial_yield: default_initial_yield(),
            long_term_yield: default_initial_yield(),
            mean_reversion: default_mean_reversion(),
            yield_volatility: default_yield_volatility(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// span 진입/종료 이벤트 출력 여부
    #[serde(default)]
    pub span_events: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            span_events: false,
        }
    }
}

impl EngineConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다. 파일이 없으면 환경 변수만 사용합니다.
    pub fn load_default() -> EngineResult<Self> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            return Self::load(DEFAULT_CONFIG_PATH);
        }

        let config: EngineConfig = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        let config: EngineConfig = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 설정 검증
    pub fn validate(&self) -> EngineResult<()> {
        self.simulation.validate()?;
        if !self.comparison.tie_threshold.is_finite() || self.comparison.tie_threshold < 0.0 {
            return Err(EngineError::Config(format!(
                "tie_threshold는 0 이상이어야 합니다: {}",
                self.comparison.tie_threshold
            )));
        }
        if self.synthetic.initial_price <= 0.0 || self.synthetic.initial_yield < 0.0 {
            return Err(EngineError::Config(
                "합성 시장 데이터의 초기 가격은 양수, 초기 수익률은 0 이상이어야 합니다"
                    .to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.synthetic.mean_reversion) {
            return Err(EngineError::Config(format!(
                "mean_reversion은 0~1 사이여야 합니다: {}",
                self.synthetic.mean_reversion
            )));
        }
        Ok(())
    }
}
