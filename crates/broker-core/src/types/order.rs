//! Order types for the gateway command surface.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of the order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Type of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
    /// Stop order that converts to a limit order when triggered.
    StopLimit,
}

/// Current status of an order as reported by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order handed to the gateway but not yet acknowledged.
    PendingSubmit,
    /// Order working at the broker.
    Submitted,
    /// Order partially filled.
    PartiallyFilled,
    /// Order fully filled.
    Filled,
    /// Order cancelled.
    Cancelled,
    /// Order rejected by the broker.
    Rejected,
}

impl OrderStatus {
    /// True once the broker will report nothing further for the order.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Which escalation stage produced a protective stop price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    /// Fixed distance below average cost, placed when a position opens.
    Initial,
    /// Raised to average cost plus a small offset.
    BreakEven,
    /// Raised under the minimum low of recent qualifying bars.
    Trailing,
}

/// A complete order specification sent to the gateway.
///
/// Re-sending a ticket under an order id the broker already knows amends
/// that order in place instead of creating a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub account: String,
    pub instrument: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub limit_price: Decimal,
    /// Trigger price, present only for stop-limit orders.
    pub stop_price: Option<Decimal>,
}

impl OrderTicket {
    pub fn limit_buy(account: &str, instrument: &str, quantity: Decimal, limit_price: Decimal) -> Self {
        Self {
            account: account.to_string(),
            instrument: instrument.to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity,
            limit_price,
            stop_price: None,
        }
    }

    pub fn limit_sell(account: &str, instrument: &str, quantity: Decimal, limit_price: Decimal) -> Self {
        Self {
            account: account.to_string(),
            instrument: instrument.to_string(),
            side: OrderSide::Sell,
            order_type: OrderType::Limit,
            quantity,
            limit_price,
            stop_price: None,
        }
    }

    pub fn stop_limit_sell(
        account: &str,
        instrument: &str,
        quantity: Decimal,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            account: account.to_string(),
            instrument: instrument.to_string(),
            side: OrderSide::Sell,
            order_type: OrderType::StopLimit,
            quantity,
            limit_price,
            stop_price: Some(stop_price),
        }
    }
}

/// The protective order attached to a position, if any.
///
/// A position carries at most one protective order. Escalations amend the
/// existing broker order under the same id rather than replacing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProtectiveOrder {
    None,
    Active {
        order_id: i64,
        stop_price: Decimal,
        limit_price: Decimal,
        quantity: Decimal,
        kind: StopKind,
    },
}

impl ProtectiveOrder {
    pub fn is_active(&self) -> bool {
        matches!(self, ProtectiveOrder::Active { .. })
    }

    pub fn order_id(&self) -> Option<i64> {
        match self {
            ProtectiveOrder::None => None,
            ProtectiveOrder::Active { order_id, .. } => Some(*order_id),
        }
    }

    pub fn stop_price(&self) -> Option<Decimal> {
        match self {
            ProtectiveOrder::None => None,
            ProtectiveOrder::Active { stop_price, .. } => Some(*stop_price),
        }
    }

    pub fn quantity(&self) -> Option<Decimal> {
        match self {
            ProtectiveOrder::None => None,
            ProtectiveOrder::Active { quantity, .. } => Some(*quantity),
        }
    }

    pub fn kind(&self) -> Option<StopKind> {
        match self {
            ProtectiveOrder::None => None,
            ProtectiveOrder::Active { kind, .. } => Some(*kind),
        }
    }
}
