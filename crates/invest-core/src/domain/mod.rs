//! 도메인 모델.

mod ledger;
mod market_data;
mod parameters;
mod summary;

pub use ledger::*;
pub use market_data::*;
pub use parameters::*;
pub use summary::*;
