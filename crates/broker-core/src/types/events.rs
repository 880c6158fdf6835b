//! Events flowing from the broker session into the engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::bar::Bar;
use super::order::{OrderSide, OrderStatus, OrderTicket};

/// Which price field a tick updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickField {
    Bid,
    Ask,
    Last,
}

/// A single notification from the broker session.
///
/// The session layer pushes these into one ordered channel; the engine
/// consumes them strictly in arrival order. `Connected` and `Disconnected`
/// are synthesized by the session supervisor rather than read off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrokerEvent {
    Connected,
    Disconnected,
    /// Authoritative quantity and average cost for one account.
    PositionSnapshot {
        account: String,
        instrument: String,
        quantity: Decimal,
        avg_cost: Decimal,
    },
    Tick {
        sub_id: i64,
        field: TickField,
        price: Decimal,
    },
    OrderUpdate {
        order_id: i64,
        status: OrderStatus,
        filled: Decimal,
        remaining: Decimal,
        avg_fill_price: Decimal,
    },
    /// One fill (possibly partial) of a working order.
    Execution {
        order_id: i64,
        instrument: String,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        executed_at: DateTime<Utc>,
    },
    /// A working order replayed by the broker, typically right after connect.
    OpenOrder {
        order_id: i64,
        ticket: OrderTicket,
        status: OrderStatus,
    },
    RealtimeBar {
        sub_id: i64,
        bar: Bar,
    },
    /// Non-fatal error surfaced by the broker for an active session.
    SessionError {
        code: i32,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_wire_format() {
        let json = r#"{"type":"tick","sub_id":3,"field":"last","price":"10.25"}"#;
        let event: BrokerEvent = serde_json::from_str(json).unwrap();

        assert_eq!(
            event,
            BrokerEvent::Tick {
                sub_id: 3,
                field: TickField::Last,
                price: Decimal::new(1025, 2),
            }
        );
    }

    #[test]
    fn test_position_snapshot_wire_format() {
        let json = r#"{
            "type": "position_snapshot",
            "account": "DU000001",
            "instrument": "AAPL",
            "quantity": "300",
            "avg_cost": "10.00"
        }"#;
        let event: BrokerEvent = serde_json::from_str(json).unwrap();

        match event {
            BrokerEvent::PositionSnapshot {
                account, quantity, ..
            } => {
                assert_eq!(account, "DU000001");
                assert_eq!(quantity, Decimal::new(300, 0));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
