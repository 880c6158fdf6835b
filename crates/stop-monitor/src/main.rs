//! Stop Sentinel
//!
//! Automated stop-loss, break-even and trailing-stop management for one
//! brokerage instrument, driven entirely by gateway notifications.

mod ws;

use anyhow::Result;
use broker_core::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trading_engine::{EngineEvent, RiskEngine, SessionSupervisor};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; quiet the websocket plumbing by default.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stop_monitor=info,trading_engine=info,risk_manager=info,broker_core=info,tungstenite=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Stop Sentinel");

    let config = Config::from_env()?;
    info!(
        instrument = %config.instrument.symbol,
        gateway = %config.gateway.ws_url,
        "Configuration loaded"
    );

    let gateway = Arc::new(ws::WsGateway::new(config.gateway.ws_url.clone()));
    let engine = Arc::new(RiskEngine::new(config.clone(), gateway.clone()));
    let supervisor = Arc::new(SessionSupervisor::new(
        gateway,
        engine.clone(),
        config.reconnect.clone(),
    ));

    // Lifecycle notifications and trade records for external collaborators
    // (trade-history writer, UI) surface through the engine's event channel.
    if let Some(mut events) = engine.take_event_receiver() {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    EngineEvent::Position(update) => info!(update = ?update, "Position update"),
                    EngineEvent::Trade(record) => info!(
                        order_id = record.order_id,
                        side = ?record.side,
                        quantity = %record.quantity,
                        avg_price = %record.avg_price,
                        "Trade record"
                    ),
                }
            }
        });
    }

    // Periodic status heartbeat.
    {
        let engine = engine.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(60));
            tick.tick().await;
            loop {
                tick.tick().await;
                info!("status\n{}", engine.status());
            }
        });
    }

    let runner = {
        let supervisor = supervisor.clone();
        tokio::spawn(async move { supervisor.run().await })
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping reconnect scheduling");
    supervisor.shutdown();
    runner.abort();

    Ok(())
}
