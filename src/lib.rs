//! Stop Sentinel: automated protective-order management for one instrument.
//!
//! This is the root crate that provides test and benchmark access to the
//! internal modules. For actual functionality, use the individual crates
//! directly:
//!
//! - `broker-core`: Core types, broker session contract, configuration
//! - `risk-manager`: Bar aggregation, trailing-stop and take-profit logic
//! - `trading-engine`: Position lifecycle, protective orders, reconnection
//! - `stop-monitor`: The daemon binary wiring a websocket gateway to the engine

// Re-export for benchmarks
pub use broker_core as core;
pub use risk_manager as risk;
pub use trading_engine as trading;
