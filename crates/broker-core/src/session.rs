//! Broker session traits.
//!
//! The command surface is deliberately fire-and-forget: every method
//! enqueues work and returns immediately, with outcomes arriving later as
//! [`BrokerEvent`]s on the session's event channel. This keeps the engine
//! free to issue commands while holding its state lock.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::types::{BrokerEvent, OrderTicket};
use crate::Result;

/// Outbound command surface of a broker session.
pub trait BrokerSession: Send + Sync {
    /// Next unused client-assigned order id.
    fn next_order_id(&self) -> i64;

    /// Submit the ticket under the given id. Re-sending an id the broker
    /// already knows amends that order in place.
    fn place_order(&self, order_id: i64, ticket: &OrderTicket);

    fn cancel_order(&self, order_id: i64);

    /// Subscribe to bid/ask/last ticks for an instrument, returning the
    /// subscription id carried by the resulting [`BrokerEvent::Tick`]s.
    fn subscribe_market_data(&self, instrument: &str) -> i64;

    fn unsubscribe_market_data(&self, sub_id: i64);

    /// Subscribe to the raw real-time bar feed for an instrument.
    fn subscribe_bars(&self, instrument: &str) -> i64;

    fn unsubscribe_bars(&self, sub_id: i64);

    /// Ask the broker to replay position snapshots for all accounts.
    fn request_positions(&self);

    /// Ask the broker to replay its working orders.
    fn request_open_orders(&self);
}

/// A live broker link handed back by [`SessionTransport::connect`].
///
/// `closed` resolves once the underlying connection dies, carrying the
/// close reason. A dropped sender counts as an unclean close.
pub struct SessionHandle {
    pub closed: oneshot::Receiver<Result<()>>,
}

/// Connection factory driven by the session supervisor.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Establish one broker session, spawning whatever tasks are needed to
    /// pump [`BrokerEvent`]s into `events` until the link dies. Resolves
    /// with an error if the connection could not be established at all.
    async fn connect(&self, events: mpsc::UnboundedSender<BrokerEvent>) -> Result<SessionHandle>;
}
