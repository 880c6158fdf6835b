//! Shared test fakes.

use broker_core::session::BrokerSession;
use broker_core::types::OrderTicket;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// Fire-and-forget session that records every outbound command.
pub struct RecordingSession {
    next_id: AtomicI64,
    pub placed: Mutex<Vec<(i64, OrderTicket)>>,
    pub cancelled: Mutex<Vec<i64>>,
    pub md_subs: Mutex<Vec<String>>,
    pub md_unsubs: Mutex<Vec<i64>>,
    pub bar_subs: Mutex<Vec<String>>,
    pub bar_unsubs: Mutex<Vec<i64>>,
    pub position_requests: AtomicI64,
    pub open_order_requests: AtomicI64,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            placed: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            md_subs: Mutex::new(Vec::new()),
            md_unsubs: Mutex::new(Vec::new()),
            bar_subs: Mutex::new(Vec::new()),
            bar_unsubs: Mutex::new(Vec::new()),
            position_requests: AtomicI64::new(0),
            open_order_requests: AtomicI64::new(0),
        }
    }

    /// Last ticket placed under `order_id`, if any.
    pub fn last_ticket_for(&self, order_id: i64) -> Option<OrderTicket> {
        self.placed
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| *id == order_id)
            .map(|(_, t)| t.clone())
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerSession for RecordingSession {
    fn next_order_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn place_order(&self, order_id: i64, ticket: &OrderTicket) {
        self.placed.lock().unwrap().push((order_id, ticket.clone()));
    }

    fn cancel_order(&self, order_id: i64) {
        self.cancelled.lock().unwrap().push(order_id);
    }

    fn subscribe_market_data(&self, instrument: &str) -> i64 {
        self.md_subs.lock().unwrap().push(instrument.to_string());
        100 + self.md_subs.lock().unwrap().len() as i64
    }

    fn unsubscribe_market_data(&self, sub_id: i64) {
        self.md_unsubs.lock().unwrap().push(sub_id);
    }

    fn subscribe_bars(&self, instrument: &str) -> i64 {
        self.bar_subs.lock().unwrap().push(instrument.to_string());
        200 + self.bar_subs.lock().unwrap().len() as i64
    }

    fn unsubscribe_bars(&self, sub_id: i64) {
        self.bar_unsubs.lock().unwrap().push(sub_id);
    }

    fn request_positions(&self) {
        self.position_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn request_open_orders(&self) {
        self.open_order_requests.fetch_add(1, Ordering::SeqCst);
    }
}
