//! Core domain types for the Stop Sentinel system.

pub mod bar;
pub mod events;
pub mod order;
pub mod position;

pub use bar::*;
pub use events::*;
pub use order::*;
pub use position::*;
