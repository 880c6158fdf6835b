//! Fill aggregation for the external trade-history collaborator.
//!
//! Partial fills of one order arrive as separate execution reports; the
//! history writer wants one record per order side with a weighted-average
//! price. The book keeps a running aggregate per order and re-emits the
//! updated record on every fill, so the latest emission is always the
//! complete picture.

use broker_core::types::OrderSide;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Aggregated fills for one order side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub order_id: i64,
    pub instrument: String,
    pub side: OrderSide,
    /// Total shares filled so far.
    pub quantity: Decimal,
    /// Weighted-average fill price across all partial fills.
    pub avg_price: Decimal,
    pub first_fill_at: DateTime<Utc>,
    pub last_fill_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct FillAccum {
    record_id: Uuid,
    quantity: Decimal,
    notional: Decimal,
    first_fill_at: DateTime<Utc>,
}

/// Running per-order fill aggregation.
#[derive(Debug, Default)]
pub struct FillBook {
    open: HashMap<(i64, OrderSide), FillAccum>,
}

impl FillBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one execution and return the updated aggregate record.
    pub fn record(
        &mut self,
        order_id: i64,
        instrument: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        executed_at: DateTime<Utc>,
    ) -> TradeRecord {
        let accum = self
            .open
            .entry((order_id, side))
            .or_insert_with(|| FillAccum {
                record_id: Uuid::new_v4(),
                quantity: Decimal::ZERO,
                notional: Decimal::ZERO,
                first_fill_at: executed_at,
            });

        accum.quantity += quantity;
        accum.notional += quantity * price;

        let avg_price = if accum.quantity.is_zero() {
            price
        } else {
            accum.notional / accum.quantity
        };

        TradeRecord {
            id: accum.record_id,
            order_id,
            instrument: instrument.to_string(),
            side,
            quantity: accum.quantity,
            avg_price,
            first_fill_at: accum.first_fill_at,
            last_fill_at: executed_at,
        }
    }

    /// Drop the aggregates for an order once the broker reports it terminal.
    pub fn settle(&mut self, order_id: i64) {
        self.open.retain(|(id, _), _| *id != order_id);
    }

    pub fn open_orders(&self) -> usize {
        self.open.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_average_across_partial_fills() {
        let mut book = FillBook::new();
        let t = Utc::now();

        let first = book.record(
            7,
            "AAPL",
            OrderSide::Buy,
            Decimal::new(100, 0),
            Decimal::new(1000, 2), // 10.00
            t,
        );
        assert_eq!(first.quantity, Decimal::new(100, 0));
        assert_eq!(first.avg_price, Decimal::new(1000, 2));

        let second = book.record(
            7,
            "AAPL",
            OrderSide::Buy,
            Decimal::new(300, 0),
            Decimal::new(1004, 2), // 10.04
            t + chrono::Duration::seconds(2),
        );

        // (100 * 10.00 + 300 * 10.04) / 400 = 10.03
        assert_eq!(second.quantity, Decimal::new(400, 0));
        assert_eq!(second.avg_price, Decimal::new(1003, 2));
        assert_eq!(second.id, first.id);
        assert_eq!(second.first_fill_at, t);
    }

    #[test]
    fn test_sides_aggregate_independently() {
        let mut book = FillBook::new();
        let t = Utc::now();

        let buy = book.record(7, "AAPL", OrderSide::Buy, Decimal::ONE, Decimal::TEN, t);
        let sell = book.record(7, "AAPL", OrderSide::Sell, Decimal::ONE, Decimal::TEN, t);
        assert_ne!(buy.id, sell.id);
        assert_eq!(book.open_orders(), 2);
    }

    #[test]
    fn test_settle_drops_order_aggregates() {
        let mut book = FillBook::new();
        let t = Utc::now();
        book.record(7, "AAPL", OrderSide::Buy, Decimal::ONE, Decimal::TEN, t);
        book.record(8, "AAPL", OrderSide::Sell, Decimal::ONE, Decimal::TEN, t);

        book.settle(7);
        assert_eq!(book.open_orders(), 1);

        // A late fill after settle starts a fresh record.
        let record = book.record(7, "AAPL", OrderSide::Buy, Decimal::ONE, Decimal::TEN, t);
        assert_eq!(record.quantity, Decimal::ONE);
    }
}
