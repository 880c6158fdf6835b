//! Trading Engine
//!
//! Position lifecycle orchestration, protective-order management and broker
//! session resilience for Stop Sentinel.

pub mod engine;
pub mod protective;
pub mod quotes;
pub mod session;
pub mod trade_log;

#[cfg(test)]
pub mod test_util;

pub use engine::{BreakEvenCmd, EngineEvent, PositionEvent, RiskEngine};
pub use quotes::QuoteBoard;
pub use session::{backoff_delay, SessionSupervisor};
pub use trade_log::{FillBook, TradeRecord};
