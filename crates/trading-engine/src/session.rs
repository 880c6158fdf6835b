//! Broker session resilience.
//!
//! The supervisor owns the connection lifecycle: it drives the transport,
//! pumps its events into the engine, and schedules reconnects on a two-tier
//! backoff (a short interval for the first several consecutive failures, a
//! longer one after that). Any successful connect resets to the short tier.
//! A shutdown request stops all further scheduling.

use crate::engine::RiskEngine;
use broker_core::config::ReconnectConfig;
use broker_core::session::SessionTransport;
use broker_core::types::BrokerEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Delay before the next connection attempt after `failures` consecutive
/// failed attempts.
pub fn backoff_delay(cfg: &ReconnectConfig, failures: u32) -> Duration {
    if failures < cfg.short_tier_attempts {
        Duration::from_secs(cfg.short_interval_secs)
    } else {
        Duration::from_secs(cfg.long_interval_secs)
    }
}

pub struct SessionSupervisor {
    transport: Arc<dyn SessionTransport>,
    engine: Arc<RiskEngine>,
    reconnect: ReconnectConfig,
    shutdown: AtomicBool,
}

impl SessionSupervisor {
    pub fn new(
        transport: Arc<dyn SessionTransport>,
        engine: Arc<RiskEngine>,
        reconnect: ReconnectConfig,
    ) -> Self {
        Self {
            transport,
            engine,
            reconnect,
            shutdown: AtomicBool::new(false),
        }
    }

    /// Stop reconnect scheduling. The current link, if any, is left to die
    /// on its own; no new attempt will be made afterwards.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        info!("Session supervisor shutdown requested");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Connect/reconnect loop. Returns once shutdown is requested.
    pub async fn run(&self) {
        let mut failures = 0u32;

        loop {
            if self.is_shutdown() {
                return;
            }

            let (events_tx, mut events_rx) = mpsc::unbounded_channel::<BrokerEvent>();
            let engine = self.engine.clone();
            let pump = tokio::spawn(async move {
                while let Some(event) = events_rx.recv().await {
                    engine.handle_event(event);
                }
            });

            match self.transport.connect(events_tx).await {
                Ok(handle) => {
                    failures = 0;
                    self.engine.handle_event(BrokerEvent::Connected);

                    // Park until the link dies; the transport resolves the
                    // oneshot with the close reason.
                    match handle.closed.await {
                        Ok(Ok(())) => info!("Broker session closed cleanly"),
                        Ok(Err(e)) => warn!(error = %e, "Broker session dropped"),
                        Err(_) => warn!("Broker session task vanished"),
                    }
                    self.engine.handle_event(BrokerEvent::Disconnected);
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    warn!(failures, error = %e, "Broker connect attempt failed");
                }
            }
            pump.abort();

            if self.is_shutdown() {
                return;
            }
            let delay = backoff_delay(&self.reconnect, failures);
            info!(
                delay_secs = delay.as_secs(),
                failures, "Scheduling broker reconnect"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
