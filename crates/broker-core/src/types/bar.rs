//! Real-time bar types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV bar as delivered by the gateway bar feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Start time of the bar interval.
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub trade_count: i64,
    /// Volume-weighted average price over the bar interval.
    pub wap: Decimal,
}

impl Bar {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn range(&self) -> Decimal {
        self.high - self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: Decimal, close: Decimal) -> Bar {
        Bar {
            timestamp: Utc::now(),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: Decimal::new(100, 0),
            trade_count: 10,
            wap: (open + close) / Decimal::new(2, 0),
        }
    }

    #[test]
    fn test_bullish_requires_close_above_open() {
        assert!(bar(Decimal::new(1000, 2), Decimal::new(1010, 2)).is_bullish());
        assert!(!bar(Decimal::new(1000, 2), Decimal::new(1000, 2)).is_bullish());
        assert!(!bar(Decimal::new(1010, 2), Decimal::new(1000, 2)).is_bullish());
    }

    #[test]
    fn test_range() {
        let b = bar(Decimal::new(990, 2), Decimal::new(1020, 2));
        assert_eq!(b.range(), Decimal::new(30, 2));
    }
}
