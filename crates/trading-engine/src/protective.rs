//! Protective-order management.
//!
//! Every open position carries at most one protective stop-limit sell. All
//! escalations (break-even, trailing) and resizes amend that order in place
//! under the same broker id, so there is never a window with the position
//! unprotected mid-replace. The trigger price only ever moves up; a stale or
//! lower reprice is rejected at the point of application.

use broker_core::session::BrokerSession;
use broker_core::types::{OrderTicket, Position, ProtectiveOrder, StopKind};
use broker_core::config::RiskConfig;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Stop-price drift below which a snapshot resize keeps the existing prices
/// and only amends the order quantity.
pub const REPRICE_MATERIALITY: Decimal = Decimal::from_parts(2, 0, 0, false, 2); // 0.02

/// Place the initial protective stop for a position with no live order.
pub fn create(session: &dyn BrokerSession, pos: &mut Position, cfg: &RiskConfig) {
    create_with(
        session,
        pos,
        cfg,
        pos.avg_cost - cfg.stop_loss_distance,
        StopKind::Initial,
    );
}

fn create_with(
    session: &dyn BrokerSession,
    pos: &mut Position,
    cfg: &RiskConfig,
    stop_price: Decimal,
    kind: StopKind,
) {
    let limit_price = stop_price - cfg.sell_limit_offset;
    let order_id = session.next_order_id();
    let ticket = OrderTicket::stop_limit_sell(
        &pos.account,
        &pos.instrument,
        pos.quantity,
        stop_price,
        limit_price,
    );
    session.place_order(order_id, &ticket);

    pos.protective = ProtectiveOrder::Active {
        order_id,
        stop_price,
        limit_price,
        quantity: pos.quantity,
        kind,
    };
    info!(
        order_id,
        instrument = %pos.instrument,
        stop = %stop_price,
        limit = %limit_price,
        quantity = %pos.quantity,
        kind = ?kind,
        "Placed protective stop"
    );
}

/// Bring the live order back in line with the position after a snapshot
/// changed its quantity or cost basis.
///
/// The quantity always tracks the position. The stop is only repriced when
/// the recomputed level drifted by at least [`REPRICE_MATERIALITY`] and the
/// move is upward; anything else keeps the existing prices.
pub fn resync(session: &dyn BrokerSession, pos: &mut Position, cfg: &RiskConfig) {
    let ProtectiveOrder::Active {
        order_id,
        stop_price,
        limit_price,
        quantity,
        kind,
    } = pos.protective
    else {
        create(session, pos, cfg);
        return;
    };

    let desired_stop = pos.avg_cost - cfg.stop_loss_distance;
    let drift = (desired_stop - stop_price).abs();
    let reprice = drift >= REPRICE_MATERIALITY && desired_stop > stop_price;

    if !reprice && quantity == pos.quantity {
        return;
    }

    let (new_stop, new_limit, new_kind) = if reprice {
        (desired_stop, desired_stop - cfg.sell_limit_offset, StopKind::Initial)
    } else {
        (stop_price, limit_price, kind)
    };

    let ticket = OrderTicket::stop_limit_sell(
        &pos.account,
        &pos.instrument,
        pos.quantity,
        new_stop,
        new_limit,
    );
    session.place_order(order_id, &ticket);

    pos.protective = ProtectiveOrder::Active {
        order_id,
        stop_price: new_stop,
        limit_price: new_limit,
        quantity: pos.quantity,
        kind: new_kind,
    };
    info!(
        order_id,
        stop = %new_stop,
        quantity = %pos.quantity,
        repriced = reprice,
        "Amended protective stop after position change"
    );
}

/// Raise the stop to break-even (average cost plus a small markup).
///
/// Returns whether the escalation was applied; the caller is responsible for
/// firing this at most once per position lifetime.
pub fn escalate_break_even(
    session: &dyn BrokerSession,
    pos: &mut Position,
    cfg: &RiskConfig,
) -> bool {
    let new_stop = pos.avg_cost + cfg.break_even.offset;

    match pos.protective {
        ProtectiveOrder::None => {
            create_with(session, pos, cfg, new_stop, StopKind::BreakEven);
            true
        }
        ProtectiveOrder::Active { stop_price, .. } if new_stop <= stop_price => {
            debug!(
                new_stop = %new_stop,
                current_stop = %stop_price,
                "Break-even level not above current stop, skipping reprice"
            );
            // The threshold was crossed; the existing stop is already as
            // good or better, so the escalation still counts as done.
            true
        }
        ProtectiveOrder::Active { order_id, .. } => {
            amend_price(session, pos, order_id, new_stop, cfg, StopKind::BreakEven);
            true
        }
    }
}

/// Reprice the live order to an accepted trailing candidate.
pub fn reprice_trailing(
    session: &dyn BrokerSession,
    pos: &mut Position,
    candidate: Decimal,
    cfg: &RiskConfig,
) {
    match pos.protective {
        ProtectiveOrder::None => {
            debug!(candidate = %candidate, "No protective order to trail, skipping");
        }
        ProtectiveOrder::Active { stop_price, .. } if candidate <= stop_price => {
            debug!(
                candidate = %candidate,
                current_stop = %stop_price,
                "Stale trailing candidate rejected at application"
            );
        }
        ProtectiveOrder::Active { order_id, .. } => {
            amend_price(session, pos, order_id, candidate, cfg, StopKind::Trailing);
        }
    }
}

fn amend_price(
    session: &dyn BrokerSession,
    pos: &mut Position,
    order_id: i64,
    new_stop: Decimal,
    cfg: &RiskConfig,
    kind: StopKind,
) {
    let new_limit = new_stop - cfg.sell_limit_offset;
    let ticket = OrderTicket::stop_limit_sell(
        &pos.account,
        &pos.instrument,
        pos.quantity,
        new_stop,
        new_limit,
    );
    session.place_order(order_id, &ticket);

    pos.protective = ProtectiveOrder::Active {
        order_id,
        stop_price: new_stop,
        limit_price: new_limit,
        quantity: pos.quantity,
        kind,
    };
    info!(
        order_id,
        stop = %new_stop,
        limit = %new_limit,
        kind = ?kind,
        "Raised protective stop"
    );
}

/// Shrink the protective order ahead of a manual sell so the broker never
/// sees the same shares claimed twice. A sell consuming the whole position
/// cancels the order outright.
pub fn reduce_for_manual_sell(
    session: &dyn BrokerSession,
    pos: &mut Position,
    sell_quantity: Decimal,
) {
    let ProtectiveOrder::Active {
        order_id,
        stop_price,
        limit_price,
        kind,
        ..
    } = pos.protective
    else {
        return;
    };

    let remaining = pos.quantity - sell_quantity;
    if remaining <= Decimal::ZERO {
        cancel(session, pos);
        return;
    }

    let ticket = OrderTicket::stop_limit_sell(
        &pos.account,
        &pos.instrument,
        remaining,
        stop_price,
        limit_price,
    );
    session.place_order(order_id, &ticket);

    pos.protective = ProtectiveOrder::Active {
        order_id,
        stop_price,
        limit_price,
        quantity: remaining,
        kind,
    };
    info!(
        order_id,
        remaining = %remaining,
        sell_quantity = %sell_quantity,
        "Reduced protective stop ahead of manual sell"
    );
}

/// Cancel the live protective order, if any.
pub fn cancel(session: &dyn BrokerSession, pos: &mut Position) {
    if let ProtectiveOrder::Active { order_id, .. } = pos.protective {
        session.cancel_order(order_id);
        pos.protective = ProtectiveOrder::None;
        info!(order_id, instrument = %pos.instrument, "Cancelled protective stop");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::RecordingSession;
    use broker_core::config::Config;
    use broker_core::types::{OrderSide, OrderType};

    fn long_position(quantity: i64, avg_cost_cents: i64) -> Position {
        Position::new(
            "DU000001".to_string(),
            "AAPL".to_string(),
            Decimal::new(quantity, 0),
            Decimal::new(avg_cost_cents, 2),
        )
    }

    #[test]
    fn test_create_places_stop_below_cost() {
        let session = RecordingSession::new();
        let cfg = Config::test_config().risk;
        let mut pos = long_position(200, 1000); // 10.00

        create(&session, &mut pos, &cfg);

        let placed = session.placed.lock().unwrap();
        assert_eq!(placed.len(), 1);
        let (_, ticket) = &placed[0];
        assert_eq!(ticket.side, OrderSide::Sell);
        assert_eq!(ticket.order_type, OrderType::StopLimit);
        // 10.00 - 0.30 = 9.70, limit 9.70 - 0.05 = 9.65.
        assert_eq!(ticket.stop_price, Some(Decimal::new(970, 2)));
        assert_eq!(ticket.limit_price, Decimal::new(965, 2));
        assert_eq!(pos.protective.stop_price(), Some(Decimal::new(970, 2)));
        assert_eq!(pos.protective.kind(), Some(StopKind::Initial));
    }

    #[test]
    fn test_resync_keeps_prices_below_materiality() {
        let session = RecordingSession::new();
        let cfg = Config::test_config().risk;
        let mut pos = long_position(200, 1000);
        create(&session, &mut pos, &cfg);
        let original_id = pos.protective.order_id().unwrap();

        // Cost basis drifts by one cent, quantity doubles.
        pos.apply_snapshot(Decimal::new(400, 0), Decimal::new(1001, 2));
        resync(&session, &mut pos, &cfg);

        let placed = session.placed.lock().unwrap();
        assert_eq!(placed.len(), 2);
        let (amend_id, ticket) = &placed[1];
        // Same order id, same prices, new quantity.
        assert_eq!(*amend_id, original_id);
        assert_eq!(ticket.quantity, Decimal::new(400, 0));
        assert_eq!(ticket.stop_price, Some(Decimal::new(970, 2)));
    }

    #[test]
    fn test_resync_repricing_is_monotonic() {
        let session = RecordingSession::new();
        let cfg = Config::test_config().risk;
        let mut pos = long_position(200, 1000);
        create(&session, &mut pos, &cfg);

        // Averaging down would recompute a lower stop; quantity still tracks
        // but the trigger must not move down.
        pos.apply_snapshot(Decimal::new(400, 0), Decimal::new(950, 2));
        resync(&session, &mut pos, &cfg);
        assert_eq!(pos.protective.stop_price(), Some(Decimal::new(970, 2)));
        assert_eq!(pos.protective.quantity(), Some(Decimal::new(400, 0)));

        // Averaging up reprices once the drift is material.
        pos.apply_snapshot(Decimal::new(600, 0), Decimal::new(1050, 2));
        resync(&session, &mut pos, &cfg);
        assert_eq!(pos.protective.stop_price(), Some(Decimal::new(1020, 2)));
    }

    #[test]
    fn test_break_even_amends_in_place() {
        let session = RecordingSession::new();
        let cfg = Config::test_config().risk;
        let mut pos = long_position(200, 1000);
        create(&session, &mut pos, &cfg);
        let original_id = pos.protective.order_id().unwrap();

        assert!(escalate_break_even(&session, &mut pos, &cfg));

        // 10.00 + 0.02 break-even offset.
        assert_eq!(pos.protective.order_id(), Some(original_id));
        assert_eq!(pos.protective.stop_price(), Some(Decimal::new(1002, 2)));
        assert_eq!(pos.protective.kind(), Some(StopKind::BreakEven));
        assert!(session.cancelled.lock().unwrap().is_empty());
    }

    #[test]
    fn test_break_even_creates_when_no_order_exists() {
        let session = RecordingSession::new();
        let cfg = Config::test_config().risk;
        let mut pos = long_position(200, 1000);

        assert!(escalate_break_even(&session, &mut pos, &cfg));
        assert!(pos.protective.is_active());
        assert_eq!(pos.protective.kind(), Some(StopKind::BreakEven));
    }

    #[test]
    fn test_trailing_rejects_non_improving_candidate() {
        let session = RecordingSession::new();
        let cfg = Config::test_config().risk;
        let mut pos = long_position(200, 1000);
        create(&session, &mut pos, &cfg); // stop at 9.70

        reprice_trailing(&session, &mut pos, Decimal::new(960, 2), &cfg);
        assert_eq!(pos.protective.stop_price(), Some(Decimal::new(970, 2)));

        reprice_trailing(&session, &mut pos, Decimal::new(1010, 2), &cfg);
        assert_eq!(pos.protective.stop_price(), Some(Decimal::new(1010, 2)));
        assert_eq!(pos.protective.kind(), Some(StopKind::Trailing));
    }

    #[test]
    fn test_partial_manual_sell_shrinks_order() {
        let session = RecordingSession::new();
        let cfg = Config::test_config().risk;
        let mut pos = long_position(300, 1000);
        create(&session, &mut pos, &cfg);

        reduce_for_manual_sell(&session, &mut pos, Decimal::new(100, 0));
        assert_eq!(pos.protective.quantity(), Some(Decimal::new(200, 0)));
        assert!(session.cancelled.lock().unwrap().is_empty());
    }

    #[test]
    fn test_full_manual_sell_cancels_order() {
        let session = RecordingSession::new();
        let cfg = Config::test_config().risk;
        let mut pos = long_position(300, 1000);
        create(&session, &mut pos, &cfg);
        let order_id = pos.protective.order_id().unwrap();

        reduce_for_manual_sell(&session, &mut pos, Decimal::new(300, 0));
        assert_eq!(pos.protective, ProtectiveOrder::None);
        assert_eq!(*session.cancelled.lock().unwrap(), vec![order_id]);
    }
}
