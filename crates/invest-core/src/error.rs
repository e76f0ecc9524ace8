//! 전략 비교 엔진의 에러 타입.
//!
//! 에러는 세 갈래로 나뉩니다:
//! - **검증 에러**: 잘못된 파라미터 (빈도, 기간, 비율 합계 등). 즉시 실패합니다.
//! - **시장 데이터 에러**: 누락되었거나 잘못된 시장 데이터. 해당 실행을 중단합니다.
//! - **수치 퇴화**: 분산 0, 투입금 0, IRR 미수렴 등은 에러가 아니라
//!   지표 함수가 정의된 센티널 값(0.0 또는 +∞)으로 처리합니다.

use thiserror::Error;

/// 엔진 에러.
#[derive(Debug, Error)]
pub enum EngineError {
    /// 파라미터 검증 실패
    #[error("검증 에러: {0}")]
    Validation(String),

    /// 지원하지 않는 투자 빈도
    #[error("지원하지 않는 투자 빈도: {0}")]
    InvalidFrequency(String),

    /// 허용 범위를 벗어난 비율
    #[error("잘못된 비율 {name}: {value}")]
    InvalidRate {
        /// 파라미터 이름
        name: &'static str,
        /// 입력값 (퍼센트)
        value: f64,
    },

    /// 필요한 기간의 시장 데이터 누락
    #[error("시장 데이터 부족: {required}개 필요, {available}개 제공")]
    MissingMarketData {
        /// 필요한 데이터 포인트 수 (total_periods + 1)
        required: usize,
        /// 제공된 데이터 포인트 수
        available: usize,
    },

    /// 잘못된 시장 데이터 포인트
    #[error("잘못된 시장 데이터 (기간 {period}): {reason}")]
    InvalidMarketData {
        /// 문제가 된 기간 인덱스
        period: usize,
        /// 사유
        reason: String,
    },

    /// 원장이 테이블 계약을 위반함
    #[error("원장 계약 위반: {0}")]
    Contract(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 엔진 작업을 위한 Result 타입.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// 호출자가 입력을 고쳐야 하는 검증 에러인지 확인합니다.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_)
                | EngineError::InvalidFrequency(_)
                | EngineError::InvalidRate { .. }
        )
    }

    /// 시장 데이터 문제로 실행이 중단된 에러인지 확인합니다.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            EngineError::MissingMarketData { .. } | EngineError::InvalidMarketData { .. }
        )
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::Config(err.to_string())
    }
}
