//! Broker Core Library
//!
//! Shared broker-facing types, the session command trait and configuration
//! for the Stop Sentinel system.

pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use error::{Error, Result};
