//! Position lifecycle orchestration.
//!
//! The engine is the single serialization domain for all position, order and
//! trailing state: every broker notification and every command-boundary call
//! runs under one mutex. Outbound broker commands are fire-and-forget, so
//! nothing blocks on network I/O while the lock is held; their outcomes come
//! back later as separately locked order-status and execution events.

use crate::protective;
use crate::quotes::QuoteBoard;
use crate::trade_log::{FillBook, TradeRecord};
use broker_core::config::Config;
use broker_core::session::BrokerSession;
use broker_core::types::{
    Bar, BrokerEvent, OrderSide, OrderStatus, OrderTicket, OrderType, Position, ProtectiveOrder,
    StopKind, TickField,
};
use chrono::{DateTime, Utc};
use risk_manager::{BarAggregator, TakeProfit, TrailingStop};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Notification pushed to external collaborators (UI, trade-history writer).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Position(PositionEvent),
    Trade(TradeRecord),
}

/// Position lifecycle milestones.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Opened {
        account: String,
        instrument: String,
        quantity: Decimal,
        avg_cost: Decimal,
    },
    Changed {
        account: String,
        instrument: String,
        quantity: Decimal,
        avg_cost: Decimal,
    },
    Closed {
        account: String,
        instrument: String,
    },
}

/// One `setBreakEven` command from the control surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakEvenCmd {
    Enabled(bool),
    Trigger(Decimal),
    Offset(Decimal),
    /// Escalate the current position immediately, regardless of the trigger.
    Force,
}

/// Everything the engine mutates, guarded by one mutex.
struct EngineState {
    config: Config,
    /// Open positions in the monitored instrument, keyed by account.
    positions: HashMap<String, Position>,
    /// Manually placed sell orders still working at the broker. While any id
    /// is outstanding, automatic protective resizes and reprices are held
    /// back so the broker never sees the same shares claimed twice.
    pending_sells: HashSet<i64>,
    /// Set while a close-all sequence is winding the positions down.
    closing_all: bool,
    aggregator: BarAggregator,
    trailing: TrailingStop,
    take_profit: TakeProfit,
    fills: FillBook,
    md_sub: Option<i64>,
    bar_sub: Option<i64>,
    connected: bool,
}

impl EngineState {
    fn new(config: Config) -> Self {
        let width = config.instrument.bar_secs;
        Self {
            config,
            positions: HashMap::new(),
            pending_sells: HashSet::new(),
            closing_all: false,
            aggregator: BarAggregator::new(width),
            trailing: TrailingStop::new(),
            take_profit: TakeProfit::default(),
            fills: FillBook::new(),
            md_sub: None,
            bar_sub: None,
            connected: false,
        }
    }

    fn long_position_mut(&mut self) -> Option<&mut Position> {
        self.positions.values_mut().find(|p| p.is_long())
    }

    fn reprice_suppressed(&self) -> bool {
        self.closing_all || !self.pending_sells.is_empty()
    }
}

/// Top-level reducer over broker notifications plus the synchronous command
/// boundary exposed to the UI and control channel.
pub struct RiskEngine {
    session: Arc<dyn BrokerSession>,
    quotes: QuoteBoard,
    state: Mutex<EngineState>,
    events_tx: mpsc::UnboundedSender<EngineEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<EngineEvent>>>,
}

impl RiskEngine {
    pub fn new(config: Config, session: Arc<dyn BrokerSession>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            session,
            quotes: QuoteBoard::new(),
            state: Mutex::new(EngineState::new(config)),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Take the outbound event receiver (can only be called once).
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<EngineEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    pub fn quotes(&self) -> &QuoteBoard {
        &self.quotes
    }

    fn emit(&self, event: EngineEvent) {
        // A dropped receiver only disables external notifications.
        let _ = self.events_tx.send(event);
    }

    /// Process one broker notification.
    pub fn handle_event(&self, event: BrokerEvent) {
        let mut st = self.state.lock().unwrap();
        match event {
            BrokerEvent::Connected => self.on_connected(&mut st),
            BrokerEvent::Disconnected => self.on_disconnected(&mut st),
            BrokerEvent::PositionSnapshot {
                account,
                instrument,
                quantity,
                avg_cost,
            } => self.on_snapshot(&mut st, account, instrument, quantity, avg_cost),
            BrokerEvent::Tick {
                sub_id,
                field,
                price,
            } => self.on_tick(&mut st, sub_id, field, price),
            BrokerEvent::OrderUpdate {
                order_id, status, ..
            } => self.on_order_update(&mut st, order_id, status),
            BrokerEvent::Execution {
                order_id,
                instrument,
                side,
                quantity,
                price,
                executed_at,
            } => self.on_execution(&mut st, order_id, instrument, side, quantity, price, executed_at),
            BrokerEvent::OpenOrder {
                order_id,
                ticket,
                status,
            } => self.on_open_order(&mut st, order_id, ticket, status),
            BrokerEvent::RealtimeBar { sub_id, bar } => self.on_bar(&mut st, sub_id, bar),
            BrokerEvent::SessionError { code, message } => {
                warn!(code, message, "Broker session error");
            }
        }
    }

    fn on_connected(&self, st: &mut EngineState) {
        st.connected = true;
        let symbol = st.config.instrument.symbol.clone();
        info!(instrument = %symbol, "Broker session connected, subscribing feeds");

        st.md_sub = Some(self.session.subscribe_market_data(&symbol));
        st.bar_sub = Some(self.session.subscribe_bars(&symbol));
        // Rebuild position state from broker snapshots and re-adopt any
        // working protective stop replayed with the open orders.
        self.session.request_positions();
        self.session.request_open_orders();
    }

    fn on_disconnected(&self, st: &mut EngineState) {
        st.connected = false;
        st.md_sub = None;
        st.bar_sub = None;
        warn!("Broker session disconnected");
    }

    fn on_snapshot(
        &self,
        st: &mut EngineState,
        account: String,
        instrument: String,
        quantity: Decimal,
        avg_cost: Decimal,
    ) {
        if instrument != st.config.instrument.symbol {
            debug!(instrument = %instrument, "Snapshot for unmonitored instrument ignored");
            return;
        }
        if quantity < Decimal::ZERO {
            warn!(
                account = %account,
                quantity = %quantity,
                "Short position reported; short side is unsupported, not tracking"
            );
            return;
        }

        if quantity.is_zero() {
            if let Some(mut pos) = st.positions.remove(&account) {
                protective::cancel(&*self.session, &mut pos);
                st.take_profit.reset();
                info!(account = %account, instrument = %instrument, "Position closed");
                self.emit(EngineEvent::Position(PositionEvent::Closed {
                    account,
                    instrument,
                }));
                if st.closing_all && st.positions.is_empty() {
                    st.closing_all = false;
                    info!("Close-all complete, automatic protection re-enabled");
                }
            }
            return;
        }

        match st.positions.get_mut(&account) {
            None => {
                let mut pos =
                    Position::new(account.clone(), instrument.clone(), quantity, avg_cost);
                if let Some(last) = self.quotes.last() {
                    pos.last_price = last;
                }
                info!(
                    account = %account,
                    instrument = %instrument,
                    quantity = %quantity,
                    avg_cost = %avg_cost,
                    "Position opened"
                );
                st.take_profit.on_position_open(avg_cost);
                if st.closing_all {
                    debug!("Close-all in progress, suppressing protective order creation");
                } else {
                    protective::create(&*self.session, &mut pos, &st.config.risk);
                }
                st.positions.insert(account.clone(), pos);
                self.emit(EngineEvent::Position(PositionEvent::Opened {
                    account,
                    instrument,
                    quantity,
                    avg_cost,
                }));
            }
            Some(pos) => {
                pos.apply_snapshot(quantity, avg_cost);
                if st.closing_all {
                    debug!("Close-all in progress, protective resync skipped");
                } else if !st.pending_sells.is_empty() {
                    debug!(
                        pending = st.pending_sells.len(),
                        "Manual sell in flight, protective resync suppressed"
                    );
                } else {
                    protective::resync(&*self.session, pos, &st.config.risk);
                }
                self.emit(EngineEvent::Position(PositionEvent::Changed {
                    account,
                    instrument,
                    quantity,
                    avg_cost,
                }));
            }
        }
    }

    fn on_tick(&self, st: &mut EngineState, sub_id: i64, field: TickField, price: Decimal) {
        if st.md_sub.is_some() && st.md_sub != Some(sub_id) {
            debug!(sub_id, "Tick for stale subscription ignored");
            return;
        }
        self.quotes.update(field, price);
        if field != TickField::Last {
            return;
        }

        for pos in st.positions.values_mut() {
            pos.last_price = price;
        }

        // Take-profit and break-even are mutually exclusive per tick, with
        // take-profit evaluated first.
        if st.take_profit.should_fire(price) {
            st.take_profit.reset();
            info!(price = %price, "Take-profit target reached, closing all positions");
            let result = self.close_all_locked(st);
            debug!(result = %result, "Take-profit close-all issued");
            return;
        }

        if !st.config.risk.break_even.enabled {
            return;
        }
        if st.reprice_suppressed() {
            return;
        }
        let trigger = st.config.risk.break_even.trigger;
        for pos in st.positions.values_mut() {
            if pos.break_even_done || !pos.is_long() {
                continue;
            }
            if pos.gain_per_share() >= trigger
                && protective::escalate_break_even(&*self.session, pos, &st.config.risk)
            {
                pos.break_even_done = true;
            }
        }
    }

    fn on_order_update(&self, st: &mut EngineState, order_id: i64, status: OrderStatus) {
        if !status.is_terminal() {
            debug!(order_id, status = ?status, "Order update");
            return;
        }

        if st.pending_sells.remove(&order_id) {
            debug!(
                order_id,
                status = ?status,
                "Manual sell resolved, automatic protective management resumes"
            );
        }
        st.fills.settle(order_id);

        for pos in st.positions.values_mut() {
            if pos.protective.order_id() != Some(order_id) {
                continue;
            }
            match status {
                OrderStatus::Filled => {
                    info!(order_id, "Protective stop filled, awaiting flat snapshot");
                }
                OrderStatus::Cancelled => {
                    info!(order_id, "Protective stop cancelled");
                }
                OrderStatus::Rejected => {
                    error!(
                        order_id,
                        instrument = %pos.instrument,
                        "Protective stop rejected; position unprotected until the next triggering event"
                    );
                }
                _ => {}
            }
            pos.protective = ProtectiveOrder::None;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn on_execution(
        &self,
        st: &mut EngineState,
        order_id: i64,
        instrument: String,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        executed_at: DateTime<Utc>,
    ) {
        info!(
            order_id,
            instrument = %instrument,
            side = ?side,
            quantity = %quantity,
            price = %price,
            "Execution report"
        );
        let record = st
            .fills
            .record(order_id, &instrument, side, quantity, price, executed_at);
        self.emit(EngineEvent::Trade(record));
    }

    /// Re-adopt a working stop replayed by the broker, typically right after
    /// reconnect. The first (stop-limit, sell, monitored instrument) match
    /// wins; further matches are surfaced in the log rather than resolved.
    fn on_open_order(
        &self,
        st: &mut EngineState,
        order_id: i64,
        ticket: OrderTicket,
        status: OrderStatus,
    ) {
        if status.is_terminal()
            || ticket.order_type != OrderType::StopLimit
            || ticket.side != OrderSide::Sell
            || ticket.instrument != st.config.instrument.symbol
        {
            return;
        }
        let Some(pos) = st.positions.get_mut(&ticket.account) else {
            debug!(order_id, account = %ticket.account, "Working stop with no tracked position");
            return;
        };

        match pos.protective {
            ProtectiveOrder::None => {
                let stop_price = ticket.stop_price.unwrap_or(ticket.limit_price);
                pos.protective = ProtectiveOrder::Active {
                    order_id,
                    stop_price,
                    limit_price: ticket.limit_price,
                    quantity: ticket.quantity,
                    kind: StopKind::Initial,
                };
                info!(
                    order_id,
                    stop = %stop_price,
                    "Re-adopted working protective stop from broker replay"
                );
            }
            ProtectiveOrder::Active {
                order_id: adopted, ..
            } if adopted != order_id => {
                warn!(
                    adopted,
                    ignored = order_id,
                    "Multiple working stop orders match this position, keeping the first"
                );
            }
            _ => {}
        }
    }

    fn on_bar(&self, st: &mut EngineState, sub_id: i64, bar: Bar) {
        if st.bar_sub.is_some() && st.bar_sub != Some(sub_id) {
            debug!(sub_id, "Bar for stale subscription ignored");
            return;
        }
        let Some(combined) = st.aggregator.push(bar) else {
            return;
        };
        debug!(
            timestamp = %combined.timestamp,
            close = %combined.close,
            "Aggregated bar completed"
        );

        if st.reprice_suppressed() {
            debug!("Trailing update suppressed while orders are winding down");
            return;
        }
        let lookback = st.config.risk.trail_lookback;
        let offset = st.config.risk.trail_offset;
        let Some(pos) = st.positions.values_mut().find(|p| p.is_long()) else {
            debug!("No open position, trailing update skipped");
            return;
        };
        if !pos.protective.is_active() {
            debug!("No protective order, trailing update is a no-op");
            return;
        }

        let current_stop = pos.protective.stop_price();
        if let Some(candidate) =
            st.trailing
                .evaluate(&combined, pos.avg_cost, current_stop, lookback, offset)
        {
            protective::reprice_trailing(&*self.session, pos, candidate, &st.config.risk);
        }
    }

    /// Cancel every protective order and flatten via one aggregate limit
    /// sell. Must be called with the state lock held.
    fn close_all_locked(&self, st: &mut EngineState) -> String {
        if st.positions.is_empty() {
            return "no open positions".to_string();
        }

        let mut total = Decimal::ZERO;
        for pos in st.positions.values_mut() {
            protective::cancel(&*self.session, pos);
            if pos.is_long() {
                total += pos.quantity;
            }
        }

        if total <= Decimal::ZERO {
            return "protective orders cancelled, nothing to sell".to_string();
        }

        let Some(bid) = self.quotes.bid().or_else(|| self.quotes.last()) else {
            warn!("Close-all has no market price to work with, not placing close order");
            return "protective orders cancelled, but no market price is available to place the close order".to_string();
        };

        let limit = bid - st.config.risk.sell_limit_offset;
        let order_id = self.session.next_order_id();
        let account = st
            .positions
            .values()
            .next()
            .map(|p| p.account.clone())
            .unwrap_or_default();
        let symbol = st.config.instrument.symbol.clone();
        let ticket = OrderTicket::limit_sell(&account, &symbol, total, limit);
        self.session.place_order(order_id, &ticket);

        st.pending_sells.insert(order_id);
        st.closing_all = true;
        info!(
            order_id,
            quantity = %total,
            limit = %limit,
            "Close-all: aggregate limit sell placed"
        );
        format!("closing {} shares at limit {}", total, limit)
    }

    // ---- Command boundary -------------------------------------------------
    //
    // Each call locks the state, validates input without mutating on
    // rejection, and returns a human-readable result string. None of them
    // block on network I/O.

    pub fn set_stop_loss_distance(&self, distance: Decimal) -> String {
        if distance <= Decimal::ZERO {
            return format!("stop-loss distance must be positive, got {}", distance);
        }
        let mut st = self.state.lock().unwrap();
        st.config.risk.stop_loss_distance = distance;
        info!(distance = %distance, "Stop-loss distance updated");
        format!("stop-loss distance set to {}", distance)
    }

    pub fn set_offsets(&self, sell_limit_offset: Decimal, trail_offset: Decimal) -> String {
        if sell_limit_offset < Decimal::ZERO || trail_offset < Decimal::ZERO {
            return format!(
                "offsets must be non-negative, got sell {} / trail {}",
                sell_limit_offset, trail_offset
            );
        }
        let mut st = self.state.lock().unwrap();
        st.config.risk.sell_limit_offset = sell_limit_offset;
        st.config.risk.trail_offset = trail_offset;
        format!(
            "offsets set: sell limit {} below stop, trail {} below window low",
            sell_limit_offset, trail_offset
        )
    }

    pub fn set_max_shares(&self, max_shares: Decimal) -> String {
        if max_shares <= Decimal::ZERO {
            return format!("max shares must be positive, got {}", max_shares);
        }
        let mut st = self.state.lock().unwrap();
        st.config.risk.max_shares = max_shares;
        format!("max shares set to {}", max_shares)
    }

    /// Switch the monitored instrument. Switching to the instrument already
    /// configured is a no-op: no unsubscribe, no history clearing.
    pub fn set_instrument(&self, symbol: &str) -> String {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return "instrument symbol must not be empty".to_string();
        }

        let mut st = self.state.lock().unwrap();
        if symbol == st.config.instrument.symbol {
            return format!("already monitoring {}", symbol);
        }

        let old = std::mem::replace(&mut st.config.instrument.symbol, symbol.clone());
        if let Some(sub) = st.md_sub.take() {
            self.session.unsubscribe_market_data(sub);
        }
        if let Some(sub) = st.bar_sub.take() {
            self.session.unsubscribe_bars(sub);
        }
        st.aggregator.clear();
        st.trailing.clear();
        st.take_profit.reset();
        self.quotes.clear();

        let dropped = st.positions.len();
        if dropped > 0 {
            warn!(
                instrument = %old,
                positions = dropped,
                "Instrument switched with open positions; their protective stops stay working at the broker but are no longer managed"
            );
            st.positions.clear();
        }

        if st.connected {
            st.md_sub = Some(self.session.subscribe_market_data(&symbol));
            st.bar_sub = Some(self.session.subscribe_bars(&symbol));
            self.session.request_positions();
            self.session.request_open_orders();
        }
        info!(from = %old, to = %symbol, "Instrument switched");
        format!("now monitoring {} (was {})", symbol, old)
    }

    pub fn set_break_even(&self, cmd: BreakEvenCmd) -> String {
        let mut st = self.state.lock().unwrap();
        match cmd {
            BreakEvenCmd::Enabled(enabled) => {
                st.config.risk.break_even.enabled = enabled;
                format!("break-even {}", if enabled { "enabled" } else { "disabled" })
            }
            BreakEvenCmd::Trigger(trigger) => {
                if trigger <= Decimal::ZERO {
                    return format!("break-even trigger must be positive, got {}", trigger);
                }
                st.config.risk.break_even.trigger = trigger;
                format!("break-even trigger set to {} per share", trigger)
            }
            BreakEvenCmd::Offset(offset) => {
                if offset < Decimal::ZERO {
                    return format!("break-even offset must be non-negative, got {}", offset);
                }
                st.config.risk.break_even.offset = offset;
                format!("break-even offset set to {}", offset)
            }
            BreakEvenCmd::Force => {
                if st.reprice_suppressed() {
                    debug!("Forced break-even suppressed by in-flight sell or close-all");
                    return "cannot force break-even while sells are in flight".to_string();
                }
                let st = &mut *st;
                let Some(pos) = st.positions.values_mut().find(|p| p.is_long()) else {
                    return "no open position to escalate".to_string();
                };
                if protective::escalate_break_even(&*self.session, pos, &st.config.risk) {
                    pos.break_even_done = true;
                }
                format!(
                    "break-even forced, stop now {}",
                    pos.protective
                        .stop_price()
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "unset".to_string())
                )
            }
        }
    }

    pub fn set_take_profit(&self, target: Decimal) -> String {
        if target <= Decimal::ZERO {
            return format!("take-profit target must be positive, got {}", target);
        }
        let mut st = self.state.lock().unwrap();
        let position_open = st.positions.values().any(|p| p.is_long());
        st.take_profit.set(target, position_open);
        if position_open {
            format!("take-profit active at {}", target)
        } else {
            format!("take-profit armed at {}, will attach to the next position", target)
        }
    }

    /// Place an aggressive manual entry, capped at the configured max shares.
    pub fn buy(&self, quantity: Decimal) -> String {
        if quantity <= Decimal::ZERO {
            return format!("buy quantity must be positive, got {}", quantity);
        }
        let st = self.state.lock().unwrap();
        if quantity > st.config.risk.max_shares {
            return format!(
                "buy quantity {} exceeds max shares {}",
                quantity, st.config.risk.max_shares
            );
        }
        let Some(ask) = self.quotes.ask().or_else(|| self.quotes.last()) else {
            return "no market data yet, cannot price the buy".to_string();
        };

        let limit = ask + st.config.risk.sell_limit_offset;
        let account = st
            .positions
            .values()
            .next()
            .map(|p| p.account.clone())
            .unwrap_or_default();
        let order_id = self.session.next_order_id();
        let ticket =
            OrderTicket::limit_buy(&account, &st.config.instrument.symbol, quantity, limit);
        self.session.place_order(order_id, &ticket);
        info!(order_id, quantity = %quantity, limit = %limit, "Manual buy placed");
        format!("buying {} at limit {}", quantity, limit)
    }

    /// Place a manual sell. The protective order is shrunk (or cancelled for
    /// a full exit) before the sell is transmitted, and the sell id enters
    /// the in-flight set so automatic reprices stay out of its way.
    pub fn sell(&self, quantity: Decimal) -> String {
        if quantity <= Decimal::ZERO {
            return format!("sell quantity must be positive, got {}", quantity);
        }
        let mut st = self.state.lock().unwrap();
        let Some(bid) = self.quotes.bid().or_else(|| self.quotes.last()) else {
            return "no market data yet, cannot price the sell".to_string();
        };
        let sell_limit_offset = st.config.risk.sell_limit_offset;
        let symbol = st.config.instrument.symbol.clone();
        let Some(pos) = st.positions.values_mut().find(|p| p.is_long()) else {
            return "no open position to sell".to_string();
        };
        if quantity > pos.quantity {
            return format!(
                "sell quantity {} exceeds position size {}",
                quantity, pos.quantity
            );
        }

        protective::reduce_for_manual_sell(&*self.session, pos, quantity);

        let limit = bid - sell_limit_offset;
        let account = pos.account.clone();
        let order_id = self.session.next_order_id();
        let ticket = OrderTicket::limit_sell(&account, &symbol, quantity, limit);
        self.session.place_order(order_id, &ticket);
        st.pending_sells.insert(order_id);
        info!(order_id, quantity = %quantity, limit = %limit, "Manual sell placed");
        format!("selling {} at limit {}", quantity, limit)
    }

    /// Cancel all protective orders and flatten with one aggregate sell.
    pub fn close_all(&self) -> String {
        let mut st = self.state.lock().unwrap();
        self.close_all_locked(&mut st)
    }

    /// Human-readable snapshot of the engine state.
    pub fn status(&self) -> String {
        let st = self.state.lock().unwrap();
        let mut lines = vec![
            format!(
                "instrument: {} ({})",
                st.config.instrument.symbol,
                if st.connected { "connected" } else { "disconnected" }
            ),
            format!(
                "risk: stop distance {}, sell offset {}, trail offset {} x{} bars, max shares {}",
                st.config.risk.stop_loss_distance,
                st.config.risk.sell_limit_offset,
                st.config.risk.trail_offset,
                st.config.risk.trail_lookback,
                st.config.risk.max_shares,
            ),
            format!(
                "break-even: {} trigger {} offset {}",
                if st.config.risk.break_even.enabled { "on" } else { "off" },
                st.config.risk.break_even.trigger,
                st.config.risk.break_even.offset,
            ),
            format!("take-profit: {:?}", st.take_profit),
            format!(
                "quotes: bid {:?} ask {:?} last {:?}",
                self.quotes.bid(),
                self.quotes.ask(),
                self.quotes.last()
            ),
            format!(
                "trailing window: {} bars; pending sells: {}; closing-all: {}",
                st.trailing.len(),
                st.pending_sells.len(),
                st.closing_all
            ),
        ];
        if st.positions.is_empty() {
            lines.push("positions: none".to_string());
        }
        for pos in st.positions.values() {
            let protection = match pos.protective {
                ProtectiveOrder::None => "unprotected".to_string(),
                ProtectiveOrder::Active {
                    order_id,
                    stop_price,
                    kind,
                    ..
                } => format!("stop {} ({:?}, order {})", stop_price, kind, order_id),
            };
            lines.push(format!(
                "position {}: {} @ {} (last {}), {}",
                pos.account, pos.quantity, pos.avg_cost, pos.last_price, protection
            ));
        }
        lines.join("\n")
    }
}
