//! Live quote cache.
//!
//! Last observed bid/ask/last prices, written straight from the tick path
//! without taking the engine lock. Staleness is tolerable here: the board is
//! only read for display and for pricing aggressive exit orders, never for
//! the state transitions themselves.

use broker_core::types::TickField;
use dashmap::DashMap;
use rust_decimal::Decimal;

#[derive(Debug, Default)]
pub struct QuoteBoard {
    prices: DashMap<TickField, Decimal>,
}

impl QuoteBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, field: TickField, price: Decimal) {
        self.prices.insert(field, price);
    }

    pub fn get(&self, field: TickField) -> Option<Decimal> {
        self.prices.get(&field).map(|p| *p)
    }

    pub fn bid(&self) -> Option<Decimal> {
        self.get(TickField::Bid)
    }

    pub fn ask(&self) -> Option<Decimal> {
        self.get(TickField::Ask)
    }

    pub fn last(&self) -> Option<Decimal> {
        self.get(TickField::Last)
    }

    /// Drop all cached prices, called on instrument switch.
    pub fn clear(&self) {
        self.prices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_read_back() {
        let board = QuoteBoard::new();
        assert_eq!(board.bid(), None);

        board.update(TickField::Bid, Decimal::new(995, 2));
        board.update(TickField::Ask, Decimal::new(1005, 2));
        board.update(TickField::Last, Decimal::new(1000, 2));

        assert_eq!(board.bid(), Some(Decimal::new(995, 2)));
        assert_eq!(board.ask(), Some(Decimal::new(1005, 2)));
        assert_eq!(board.last(), Some(Decimal::new(1000, 2)));
    }

    #[test]
    fn test_clear_resets_all_fields() {
        let board = QuoteBoard::new();
        board.update(TickField::Last, Decimal::new(1000, 2));
        board.clear();
        assert_eq!(board.last(), None);
    }
}
