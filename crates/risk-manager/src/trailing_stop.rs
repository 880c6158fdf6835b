//! Trailing-stop computation over qualifying bars.
//!
//! Each completed bar is checked against the qualification rule (close
//! strictly above open and strictly above the position's average cost);
//! qualifying bars enter a bounded window and the candidate stop is the
//! minimum low over that window minus a configured offset. A candidate is
//! only surfaced when it would raise the current stop, which keeps the
//! protective trigger price non-decreasing no matter how stale or
//! out-of-order the triggering bar was.

use broker_core::types::Bar;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use tracing::debug;

/// Bounded history of qualifying bars for one instrument.
#[derive(Debug, Clone, Default)]
pub struct TrailingStop {
    window: VecDeque<Bar>,
}

impl TrailingStop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one completed bar.
    ///
    /// Returns the new candidate stop price when the bar qualifies and the
    /// resulting candidate improves on `current_stop`. Bars delivered by the
    /// aggregation pipeline are treated as already completed; there is no
    /// extra wait for a following bar.
    pub fn evaluate(
        &mut self,
        bar: &Bar,
        avg_cost: Decimal,
        current_stop: Option<Decimal>,
        lookback: usize,
        offset: Decimal,
    ) -> Option<Decimal> {
        if bar.close <= bar.open || bar.close <= avg_cost {
            debug!(
                close = %bar.close,
                open = %bar.open,
                avg_cost = %avg_cost,
                "Bar does not qualify for trailing window"
            );
            return None;
        }

        self.window.push_back(bar.clone());
        while self.window.len() > lookback {
            self.window.pop_front();
        }

        let min_low = self.window.iter().map(|b| b.low).min()?;
        let candidate = min_low - offset;

        match current_stop {
            Some(stop) if candidate <= stop => {
                debug!(
                    candidate = %candidate,
                    current_stop = %stop,
                    "Trailing candidate below current stop, rejected"
                );
                None
            }
            _ => Some(candidate),
        }
    }

    /// Drop all recorded bars, called on instrument switch.
    pub fn clear(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
