//! 전략 비교 CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 파라미터 환산 (convert)
//! - 시장 데이터 파일 기반 전략 비교 (compare)
//! - 합성 시장 시뮬레이션 (simulate)
//! - JSON 요약 / CSV 원장 출력

pub mod commands;
