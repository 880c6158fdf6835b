//! Take-profit state machine.
//!
//! A single target price exists at a time, either armed while flat or bound
//! to the open position. The caller owns the close routine; this type only
//! decides when it should run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Result of attaching an armed target to a newly opened position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// No target was armed.
    NotArmed,
    /// The target became active against the new position.
    Activated,
    /// The entry left no room for profit; the target was dropped.
    Discarded,
}

/// Take-profit target, at most one across both modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TakeProfit {
    #[default]
    Inactive,
    /// Target set while flat, waiting for the next position to open.
    Armed { target: Decimal },
    /// Target bound to the open position.
    Active { target: Decimal },
}

impl TakeProfit {
    /// Set a new target, clearing any prior one in either mode.
    pub fn set(&mut self, target: Decimal, position_open: bool) {
        if *self != TakeProfit::Inactive {
            debug!(prior = ?self, "Replacing existing take-profit target");
        }
        *self = if position_open {
            TakeProfit::Active { target }
        } else {
            TakeProfit::Armed { target }
        };
        info!(target = %target, state = ?self, "Take-profit target set");
    }

    /// Attach an armed target to a position opening at `entry`.
    ///
    /// An entry at or above the target can never reach it profitably for a
    /// long position, so the armed target is dropped rather than activated.
    pub fn on_position_open(&mut self, entry: Decimal) -> ArmOutcome {
        match *self {
            TakeProfit::Armed { target } => {
                if entry >= target {
                    warn!(
                        target = %target,
                        entry = %entry,
                        "Entry at or above armed take-profit target, discarding target"
                    );
                    *self = TakeProfit::Inactive;
                    ArmOutcome::Discarded
                } else {
                    *self = TakeProfit::Active { target };
                    info!(target = %target, entry = %entry, "Take-profit target activated");
                    ArmOutcome::Activated
                }
            }
            _ => ArmOutcome::NotArmed,
        }
    }

    /// True when an active target is reached at `price`. The caller must
    /// [`reset`](Self::reset) before running the close routine.
    pub fn should_fire(&self, price: Decimal) -> bool {
        matches!(*self, TakeProfit::Active { target } if price >= target)
    }

    /// Back to `Inactive`, dropping any armed or active target.
    pub fn reset(&mut self) {
        *self = TakeProfit::Inactive;
    }

    pub fn target(&self) -> Option<Decimal> {
        match *self {
            TakeProfit::Inactive => None,
            TakeProfit::Armed { target } | TakeProfit::Active { target } => Some(target),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TakeProfit::Active { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_while_flat_arms() {
        let mut tp = TakeProfit::default();
        tp.set(Decimal::new(1000, 2), false);
        assert_eq!(tp, TakeProfit::Armed { target: Decimal::new(1000, 2) });
        assert!(!tp.is_active());
    }

    #[test]
    fn test_set_while_open_activates_directly() {
        let mut tp = TakeProfit::default();
        tp.set(Decimal::new(1000, 2), true);
        assert!(tp.is_active());
    }

    #[test]
    fn test_new_target_clears_prior_in_either_mode() {
        let mut tp = TakeProfit::default();
        tp.set(Decimal::new(1000, 2), false);
        tp.set(Decimal::new(1100, 2), true);
        assert_eq!(tp.target(), Some(Decimal::new(1100, 2)));
        assert!(tp.is_active());
    }

    #[test]
    fn test_unprofitable_entry_discards_armed_target() {
        let mut tp = TakeProfit::default();
        tp.set(Decimal::new(1000, 2), false); // armed at 10.00

        // Entry at 10.05 leaves no room for profit.
        assert_eq!(tp.on_position_open(Decimal::new(1005, 2)), ArmOutcome::Discarded);
        assert_eq!(tp, TakeProfit::Inactive);
    }

    #[test]
    fn test_profitable_entry_activates_armed_target() {
        let mut tp = TakeProfit::default();
        tp.set(Decimal::new(1000, 2), false);

        assert_eq!(tp.on_position_open(Decimal::new(990, 2)), ArmOutcome::Activated);
        assert!(tp.is_active());
    }

    #[test]
    fn test_fires_only_while_active_at_or_above_target() {
        let mut tp = TakeProfit::default();
        assert!(!tp.should_fire(Decimal::new(2000, 2)));

        tp.set(Decimal::new(1000, 2), true);
        assert!(!tp.should_fire(Decimal::new(999, 2)));
        assert!(tp.should_fire(Decimal::new(1000, 2)));
        assert!(tp.should_fire(Decimal::new(1001, 2)));

        // Armed targets observe prices but never fire.
        tp.set(Decimal::new(1000, 2), false);
        assert!(!tp.should_fire(Decimal::new(1100, 2)));
    }

    #[test]
    fn test_reset_clears_any_mode() {
        let mut tp = TakeProfit::default();
        tp.set(Decimal::new(1000, 2), true);
        tp.reset();
        assert_eq!(tp, TakeProfit::Inactive);
        assert_eq!(tp.target(), None);
    }
}
