//! 시뮬레이션 파라미터 명령줄 오버라이드.

use anyhow::{Context, Result};
use clap::Args;

use invest_core::{Frequency, SimulationParameters};

/// 설정 파일의 `[simulation]` 값을 덮어쓰는 공통 인자.
#[derive(Debug, Clone, Default, Args)]
pub struct SimulationArgs {
    /// 투자 기간 (년, 1~40)
    #[arg(short = 'y', long)]
    pub years: Option<u32>,

    /// 투자 주기 (monthly, quarterly, semi-annually, annually)
    #[arg(short, long)]
    pub frequency: Option<String>,

    /// 초기 투자금
    #[arg(long)]
    pub initial: Option<f64>,

    /// 연간 추가 투자금
    #[arg(long)]
    pub annual: Option<f64>,

    /// 주식 비중 (%), 채권 비중은 100 - 주식 비중
    #[arg(long)]
    pub stock_ratio: Option<f64>,

    /// 연 성장률 (%)
    #[arg(short, long, allow_hyphen_values = true)]
    pub growth: Option<f64>,

    /// 연 인플레이션율 (%)
    #[arg(short, long)]
    pub inflation: Option<f64>,

    /// 무위험 수익률 (%)
    #[arg(long)]
    pub risk_free: Option<f64>,

    /// 인플레이션 조정 끄기
    #[arg(long, default_value = "false")]
    pub no_inflation_adjustment: bool,
}

impl SimulationArgs {
    /// 기본 파라미터에 명령줄 값을 적용합니다.
    pub fn apply(&self, base: &SimulationParameters) -> Result<SimulationParameters> {
        let mut params = base.clone();

        if let Some(frequency) = &self.frequency {
            params.frequency = frequency
                .parse::<Frequency>()
                .with_context(|| format!("Invalid frequency: {}", frequency))?;
        }
        if let Some(years) = self.years {
            params.investment_years = years;
        }
        if let Some(initial) = self.initial {
            params.initial_investment = initial;
        }
        if let Some(annual) = self.annual {
            params.annual_investment = annual;
        }
        if let Some(stock) = self.stock_ratio {
            params = params.with_stock_ratio(stock);
        }
        if let Some(growth) = self.growth {
            params.annual_growth_rate = growth;
        }
        if let Some(inflation) = self.inflation {
            params.annual_inflation_rate = inflation;
        }
        if let Some(rate) = self.risk_free {
            params.risk_free_rate = rate;
        }
        if self.no_inflation_adjustment {
            params.inflation_adjusted = false;
        }

        params.validate().context("Invalid simulation parameters")?;
        Ok(params)
    }
}
