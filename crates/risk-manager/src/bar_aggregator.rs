//! Raw-bar aggregation.
//!
//! The gateway bar feed delivers narrow fixed-width bars (5s by default);
//! the trailing-stop engine works on double-width bars. The aggregator pairs
//! consecutive raw bars into one combined bar, discarding everything until
//! the first bar that starts on a combined-bar boundary so the output grid
//! is time-aligned no matter when the feed was joined.

use broker_core::types::Bar;
use chrono::{Duration, Timelike};
use rust_decimal::Decimal;
use tracing::debug;

/// Pairs raw bars into double-width bars for one instrument.
#[derive(Debug, Clone)]
pub struct BarAggregator {
    /// Width of the emitted combined bars, in seconds.
    width_secs: u32,
    /// First half of the pair currently being built.
    pending: Option<Bar>,
    /// Set once the first boundary-aligned raw bar has been seen.
    aligned: bool,
}

impl BarAggregator {
    pub fn new(width_secs: u32) -> Self {
        Self {
            width_secs,
            pending: None,
            aligned: false,
        }
    }

    /// Feed one raw bar, returning the combined bar when it completes a pair.
    pub fn push(&mut self, bar: Bar) -> Option<Bar> {
        if !self.aligned {
            if bar.timestamp.second() % self.width_secs != 0 {
                debug!(
                    timestamp = %bar.timestamp,
                    width_secs = self.width_secs,
                    "Discarding raw bar before alignment"
                );
                return None;
            }
            self.aligned = true;
        }

        match self.pending.take() {
            None => {
                self.pending = Some(bar);
                None
            }
            Some(first) => Some(Self::combine(first, bar, self.width_secs)),
        }
    }

    /// Reset pending and alignment state, called on instrument switch.
    pub fn clear(&mut self) {
        self.pending = None;
        self.aligned = false;
    }

    fn combine(first: Bar, second: Bar, width_secs: u32) -> Bar {
        let volume = first.volume + second.volume;
        let wap = if volume.is_zero() {
            (first.wap + second.wap) / Decimal::new(2, 0)
        } else {
            (first.wap * first.volume + second.wap * second.volume) / volume
        };

        Bar {
            // The two raw bars may not be exactly contiguous, so the combined
            // stamp is the pair's end time rather than the second bar's own.
            timestamp: first.timestamp + Duration::seconds(width_secs as i64),
            open: first.open,
            high: first.high.max(second.high),
            low: first.low.min(second.low),
            close: second.close,
            volume,
            trade_count: first.trade_count + second.trade_count,
            wap,
        }
    }
}
