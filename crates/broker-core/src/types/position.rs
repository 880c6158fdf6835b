//! Position types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::ProtectiveOrder;

/// A tracked position in the monitored instrument, keyed by account.
///
/// Quantity and average cost always come from broker snapshots; the engine
/// never infers them from its own fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub account: String,
    pub instrument: String,
    /// Signed share quantity. Positive means long.
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    /// Most recent last-trade price, zero until the first tick arrives.
    pub last_price: Decimal,
    pub opened_at: DateTime<Utc>,
    pub protective: ProtectiveOrder,
    /// Set once the break-even escalation has run for this position.
    pub break_even_done: bool,
}

impl Position {
    pub fn new(account: String, instrument: String, quantity: Decimal, avg_cost: Decimal) -> Self {
        Self {
            account,
            instrument,
            quantity,
            avg_cost,
            last_price: Decimal::ZERO,
            opened_at: Utc::now(),
            protective: ProtectiveOrder::None,
            break_even_done: false,
        }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Overwrite quantity and average cost from a broker snapshot.
    pub fn apply_snapshot(&mut self, quantity: Decimal, avg_cost: Decimal) {
        self.quantity = quantity;
        self.avg_cost = avg_cost;
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        if self.last_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.last_price - self.avg_cost) * self.quantity
    }

    pub fn gain_per_share(&self) -> Decimal {
        if self.last_price.is_zero() {
            return Decimal::ZERO;
        }
        self.last_price - self.avg_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_position_is_unprotected() {
        let pos = Position::new(
            "DU000001".to_string(),
            "AAPL".to_string(),
            Decimal::new(300, 0),
            Decimal::new(1000, 2),
        );

        assert!(pos.is_long());
        assert!(!pos.is_flat());
        assert_eq!(pos.protective, ProtectiveOrder::None);
        assert!(!pos.break_even_done);
    }

    #[test]
    fn test_unrealized_pnl_uses_last_price() {
        let mut pos = Position::new(
            "DU000001".to_string(),
            "AAPL".to_string(),
            Decimal::new(100, 0),
            Decimal::new(1000, 2), // 10.00
        );

        // No tick yet.
        assert_eq!(pos.unrealized_pnl(), Decimal::ZERO);

        pos.last_price = Decimal::new(1025, 2); // 10.25
        assert_eq!(pos.unrealized_pnl(), Decimal::new(25, 0));
        assert_eq!(pos.gain_per_share(), Decimal::new(25, 2));
    }

    #[test]
    fn test_apply_snapshot_overwrites() {
        let mut pos = Position::new(
            "DU000001".to_string(),
            "AAPL".to_string(),
            Decimal::new(300, 0),
            Decimal::new(1000, 2),
        );

        pos.apply_snapshot(Decimal::new(100, 0), Decimal::new(990, 2));
        assert_eq!(pos.quantity, Decimal::new(100, 0));
        assert_eq!(pos.avg_cost, Decimal::new(990, 2));
    }
}
