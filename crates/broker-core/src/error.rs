//! Error types for the Stop Sentinel system.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Invalid market data: {0}")]
    InvalidMarketData(String),

    #[error("Position error: {0}")]
    Position(String),

    #[error("Order error: {message}")]
    Order { message: String },

    #[error("Command rejected: {0}")]
    Command(String),
}

pub type Result<T> = std::result::Result<T, Error>;
