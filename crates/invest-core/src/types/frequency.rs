//! 투자 빈도 정의.
//!
//! 연 단위 파라미터를 기간 단위로 환산할 때의 기준이 되는 빈도 타입입니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// 투자(적립) 빈도.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// 매월
    Monthly,
    /// 매분기
    Quarterly,
    /// 반기
    SemiAnnually,
    /// 매년
    Annually,
}

impl Frequency {
    /// 지원하는 모든 빈도.
    pub const ALL: [Frequency; 4] = [
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::SemiAnnually,
        Frequency::Annually,
    ];

    /// 연간 기간 수를 반환합니다.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::SemiAnnually => 2,
            Frequency::Annually => 1,
        }
    }

    /// 한 기간의 개월 수를 반환합니다.
    pub fn months_per_period(&self) -> u32 {
        12 / self.periods_per_year()
    }

    /// 설정/CLI 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::SemiAnnually => "semi_annually",
            Frequency::Annually => "annually",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "monthly" | "m" => Ok(Frequency::Monthly),
            "quarterly" | "q" => Ok(Frequency::Quarterly),
            "semi_annually" | "semiannually" | "semi_annual" | "h" => Ok(Frequency::SemiAnnually),
            "annually" | "annual" | "yearly" | "y" => Ok(Frequency::Annually),
            _ => Err(EngineError::InvalidFrequency(s.to_string())),
        }
    }
}
