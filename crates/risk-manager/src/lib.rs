//! Risk Manager
//!
//! Bar aggregation, trailing-stop computation and take-profit state for
//! protecting a long position.

pub mod bar_aggregator;
pub mod take_profit;
pub mod trailing_stop;

pub use bar_aggregator::BarAggregator;
pub use take_profit::{ArmOutcome, TakeProfit};
pub use trailing_stop::TrailingStop;
