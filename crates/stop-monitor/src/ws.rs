//! WebSocket gateway session.
//!
//! Thin JSON plumbing between the broker gateway and the core: commands go
//! out as JSON frames, notifications come back as JSON frames and are turned
//! into [`BrokerEvent`]s. Commands are queued on an unbounded channel, so
//! the [`BrokerSession`] surface never blocks; whatever connection is live
//! drains the queue.

use async_trait::async_trait;
use broker_core::session::{BrokerSession, SessionHandle, SessionTransport};
use broker_core::types::{Bar, BrokerEvent, OrderTicket};
use broker_core::{Error, Result};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

const PING_INTERVAL_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 120;

/// Outbound command frame.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Command {
    PlaceOrder { order_id: i64, ticket: OrderTicket },
    CancelOrder { order_id: i64 },
    SubscribeMarketData { sub_id: i64, instrument: String },
    UnsubscribeMarketData { sub_id: i64 },
    SubscribeBars { sub_id: i64, instrument: String },
    UnsubscribeBars { sub_id: i64 },
    RequestPositions,
    RequestOpenOrders,
}

/// Raw bar frame with a lenient string timestamp. An unparseable stamp
/// drops the one bar instead of killing the whole read loop.
#[derive(Debug, Deserialize)]
struct RawBarFrame {
    sub_id: i64,
    timestamp: String,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
    trade_count: i64,
    wap: Decimal,
}

/// Parse one inbound text frame into a broker event.
fn parse_frame(text: &str) -> Option<BrokerEvent> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Unparseable gateway frame dropped");
            return None;
        }
    };

    if value.get("type").and_then(|t| t.as_str()) == Some("realtime_bar") {
        let frame: RawBarFrame = match serde_json::from_value(value) {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "Malformed bar frame dropped");
                return None;
            }
        };
        let timestamp = match DateTime::parse_from_rfc3339(&frame.timestamp) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                warn!(
                    timestamp = %frame.timestamp,
                    error = %e,
                    "Bar with unparseable timestamp dropped"
                );
                return None;
            }
        };
        return Some(BrokerEvent::RealtimeBar {
            sub_id: frame.sub_id,
            bar: Bar {
                timestamp,
                open: frame.open,
                high: frame.high,
                low: frame.low,
                close: frame.close,
                volume: frame.volume,
                trade_count: frame.trade_count,
                wap: frame.wap,
            },
        });
    }

    match serde_json::from_value::<BrokerEvent>(value) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "Unrecognized gateway frame dropped");
            None
        }
    }
}

/// Gateway link implementing both halves of the session contract: the
/// fire-and-forget command surface and the connection factory the
/// supervisor drives.
pub struct WsGateway {
    url: String,
    next_order_id: AtomicI64,
    next_sub_id: AtomicI64,
    commands_tx: mpsc::UnboundedSender<Command>,
    commands_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Command>>>,
}

impl WsGateway {
    pub fn new(url: String) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            url,
            next_order_id: AtomicI64::new(1),
            next_sub_id: AtomicI64::new(1),
            commands_tx,
            commands_rx: Arc::new(tokio::sync::Mutex::new(commands_rx)),
        }
    }

    fn send(&self, command: Command) {
        // The receiver lives as long as the gateway, so this cannot fail.
        let _ = self.commands_tx.send(command);
    }
}

impl BrokerSession for WsGateway {
    fn next_order_id(&self) -> i64 {
        self.next_order_id.fetch_add(1, Ordering::SeqCst)
    }

    fn place_order(&self, order_id: i64, ticket: &OrderTicket) {
        self.send(Command::PlaceOrder {
            order_id,
            ticket: ticket.clone(),
        });
    }

    fn cancel_order(&self, order_id: i64) {
        self.send(Command::CancelOrder { order_id });
    }

    fn subscribe_market_data(&self, instrument: &str) -> i64 {
        let sub_id = self.next_sub_id.fetch_add(1, Ordering::SeqCst);
        self.send(Command::SubscribeMarketData {
            sub_id,
            instrument: instrument.to_string(),
        });
        sub_id
    }

    fn unsubscribe_market_data(&self, sub_id: i64) {
        self.send(Command::UnsubscribeMarketData { sub_id });
    }

    fn subscribe_bars(&self, instrument: &str) -> i64 {
        let sub_id = self.next_sub_id.fetch_add(1, Ordering::SeqCst);
        self.send(Command::SubscribeBars {
            sub_id,
            instrument: instrument.to_string(),
        });
        sub_id
    }

    fn unsubscribe_bars(&self, sub_id: i64) {
        self.send(Command::UnsubscribeBars { sub_id });
    }

    fn request_positions(&self) {
        self.send(Command::RequestPositions);
    }

    fn request_open_orders(&self) {
        self.send(Command::RequestOpenOrders);
    }
}

#[async_trait]
impl SessionTransport for WsGateway {
    async fn connect(
        &self,
        events: mpsc::UnboundedSender<BrokerEvent>,
    ) -> Result<SessionHandle> {
        let (ws_stream, _) = connect_async(&self.url).await?;
        info!(url = %self.url, "Gateway websocket connected");

        let commands = self.commands_rx.clone();
        let (closed_tx, closed_rx) = oneshot::channel();
        tokio::spawn(async move {
            // Holding the command-queue lock for the connection lifetime
            // keeps exactly one writer draining it.
            let mut commands = commands.lock().await;
            let result = pump(ws_stream, &mut commands, events).await;
            let _ = closed_tx.send(result);
        });

        Ok(SessionHandle { closed: closed_rx })
    }
}

async fn pump(
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<BrokerEvent>,
) -> Result<()> {
    let (mut write, mut read) = ws_stream.split();

    let mut ping_tick = tokio::time::interval(StdDuration::from_secs(PING_INTERVAL_SECS));
    ping_tick.tick().await;

    // The deadline only resets on received frames, so a silent gateway is
    // detected even while pings keep flowing out.
    let read_deadline = tokio::time::sleep(StdDuration::from_secs(READ_TIMEOUT_SECS));
    tokio::pin!(read_deadline);

    loop {
        tokio::select! {
            maybe_command = commands.recv() => {
                let Some(command) = maybe_command else {
                    info!("Command channel closed, shutting down gateway link");
                    return Ok(());
                };
                let frame = serde_json::to_string(&command)?;
                write.send(Message::Text(frame)).await?;
            }
            _ = ping_tick.tick() => {
                write.send(Message::Ping(Vec::new())).await?;
            }
            _ = &mut read_deadline => {
                warn!(timeout_secs = READ_TIMEOUT_SECS, "Gateway silent past read deadline");
                return Err(Error::Session {
                    message: format!("no gateway frames for {}s", READ_TIMEOUT_SECS),
                });
            }
            maybe_msg = read.next() => {
                read_deadline.as_mut().reset(
                    tokio::time::Instant::now() + StdDuration::from_secs(READ_TIMEOUT_SECS),
                );
                let Some(msg) = maybe_msg else {
                    warn!("Gateway stream ended");
                    return Ok(());
                };
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Some(event) = parse_frame(&text) {
                            if events.send(event).is_err() {
                                warn!("Event receiver dropped, closing gateway link");
                                return Ok(());
                            }
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Ok(Message::Pong(_)) => {
                        debug!("Gateway pong");
                    }
                    Ok(Message::Close(_)) => {
                        info!("Gateway closed the connection");
                        return Ok(());
                    }
                    Err(e) => {
                        warn!(error = %e, "Gateway receive error");
                        return Err(e.into());
                    }
                    _ => {}
                }
            }
        }
    }
}
