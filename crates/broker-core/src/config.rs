//! Configuration management for the Stop Sentinel system.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

use crate::Result;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub instrument: InstrumentConfig,
    pub risk: RiskConfig,
    pub reconnect: ReconnectConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub ws_url: String,
}

/// Instrument and bar-feed settings.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    /// Width of the raw bars delivered by the gateway, in seconds.
    pub raw_bar_secs: u32,
    /// Width of the aggregated bars fed to the trailing-stop engine.
    pub bar_secs: u32,
}

/// Live-tunable risk parameters. The engine holds its own copy of this
/// struct and mutates it through the command boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Distance below average cost for the initial protective stop.
    pub stop_loss_distance: Decimal,
    /// Offset below the stop trigger for the protective limit price, also
    /// used when pricing aggressive manual entries and exits.
    pub sell_limit_offset: Decimal,
    /// Offset below the windowed minimum low for trailing-stop candidates.
    pub trail_offset: Decimal,
    /// Number of qualifying bars retained in the trailing window.
    pub trail_lookback: usize,
    /// Hard cap on the share quantity of a single entry order.
    pub max_shares: Decimal,
    pub break_even: BreakEvenConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BreakEvenConfig {
    pub enabled: bool,
    /// Unrealized gain per share that arms the break-even escalation.
    pub trigger: Decimal,
    /// Offset above average cost for the escalated stop.
    pub offset: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    pub short_interval_secs: u64,
    pub long_interval_secs: u64,
    /// Consecutive failures tolerated before switching to the long interval.
    pub short_tier_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            gateway: GatewayConfig {
                ws_url: env::var("GATEWAY_WS_URL")
                    .unwrap_or_else(|_| "ws://127.0.0.1:7497/ws".to_string()),
            },
            instrument: InstrumentConfig {
                symbol: env::var("INSTRUMENT").unwrap_or_else(|_| "AAPL".to_string()),
                raw_bar_secs: parse_env("RAW_BAR_SECS", 5),
                bar_secs: parse_env("BAR_SECS", 10),
            },
            risk: RiskConfig {
                stop_loss_distance: parse_env("STOP_LOSS_DISTANCE", Decimal::new(30, 2)),
                sell_limit_offset: parse_env("SELL_LIMIT_OFFSET", Decimal::new(5, 2)),
                trail_offset: parse_env("TRAIL_OFFSET", Decimal::new(10, 2)),
                trail_lookback: parse_env("TRAIL_LOOKBACK", 3),
                max_shares: parse_env("MAX_SHARES", Decimal::new(1000, 0)),
                break_even: BreakEvenConfig {
                    enabled: parse_env("BREAK_EVEN_ENABLED", true),
                    trigger: parse_env("BREAK_EVEN_TRIGGER", Decimal::new(25, 2)),
                    offset: parse_env("BREAK_EVEN_OFFSET", Decimal::new(2, 2)),
                },
            },
            reconnect: ReconnectConfig {
                short_interval_secs: parse_env("RECONNECT_SHORT_SECS", 10),
                long_interval_secs: parse_env("RECONNECT_LONG_SECS", 60),
                short_tier_attempts: parse_env("RECONNECT_SHORT_ATTEMPTS", 5),
            },
        })
    }

    /// Load configuration for testing (with defaults).
    pub fn test_config() -> Self {
        Self {
            gateway: GatewayConfig {
                ws_url: "ws://127.0.0.1:7497/ws".to_string(),
            },
            instrument: InstrumentConfig {
                symbol: "AAPL".to_string(),
                raw_bar_secs: 5,
                bar_secs: 10,
            },
            risk: RiskConfig {
                stop_loss_distance: Decimal::new(30, 2),
                sell_limit_offset: Decimal::new(5, 2),
                trail_offset: Decimal::new(10, 2),
                trail_lookback: 3,
                max_shares: Decimal::new(1000, 0),
                break_even: BreakEvenConfig {
                    enabled: true,
                    trigger: Decimal::new(25, 2),
                    offset: Decimal::new(2, 2),
                },
            },
            reconnect: ReconnectConfig {
                short_interval_secs: 10,
                long_interval_secs: 60,
                short_tier_attempts: 5,
            },
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}
