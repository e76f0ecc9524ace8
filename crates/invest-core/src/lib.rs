//! # Invest Core
//!
//! VA(가치 목표) / DCA(정액 적립) 전략 비교 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 엔진 전반에서 사용되는 기본 타입을 제공합니다:
//! - 시뮬레이션 파라미터 및 기간 파라미터
//! - 시장 데이터 포인트
//! - 전략 원장(ledger) 및 요약 행
//! - 테이블 계약 (컬럼 정의, 정밀도 규칙, 원장 검증)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod table;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use table::*;
pub use types::*;
