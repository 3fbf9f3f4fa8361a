//! # Elastic Grid Node
//!
//! Hosts one node of the elastic grid dissemination network.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `info`)
//! 2. Load configuration (`node.toml` / `EG_CONFIG`, then `EG_*` environment)
//! 3. Load or generate the node key, seed the peer directory
//! 4. Bind the TCP frame server and hand inbound frames to the engine
//! 5. Drain the application outbox (pong replies)
//! 6. Connect to the catalog service, if configured, and follow its snapshots
//! 7. Optionally broadcast a ping every `ping_interval_secs`
//!
//! Ctrl-C flips the shutdown watch; every task stops on it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use eg_02_peer_directory::PeerDirectory;
use eg_05_tcp_transport::TcpFrameServer;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::adapters::empty_cells;
use node_runtime::{NodeConfig, NodeContainer, Outbound};

/// Pings are forgotten after this many intervals without completing.
const PING_RETENTION_INTERVALS: u32 = 10;

/// Running node: the container plus its background tasks.
pub struct NodeRuntime {
    container: NodeContainer,
    outbox: Option<mpsc::UnboundedReceiver<Outbound>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self> {
        let (container, outbox) = NodeContainer::new(config)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            container,
            outbox: Some(outbox),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Bind the listener and spawn every background task.
    pub async fn start(&mut self) -> Result<()> {
        let config = &self.container.config;

        info!("===========================================");
        info!("  Elastic Grid Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!(enode = %self.container.local, "Local node");

        let server = TcpFrameServer::bind(
            config.network.listen_addr(),
            Arc::clone(&self.container.node),
            config.transport.clone(),
        )
        .await
        .with_context(|| format!("Failed to bind {}", config.network.listen_addr()))?;
        tokio::spawn(server.run(self.shutdown_rx.clone()));

        if let Some(outbox) = self.outbox.take() {
            self.spawn_outbox(outbox);
        }
        if let Some(catalog) = &self.container.catalog {
            info!(endpoint = catalog.endpoint(), "Following peer catalog");
            tokio::spawn(Arc::clone(catalog).run(self.shutdown_rx.clone()));
        }
        if let Some(interval) = config.ping_interval() {
            self.spawn_pinger(interval);
        }

        let layout = self.container.node.current_layout();
        info!(
            peers = self.container.peers.count(),
            %layout,
            empty_cells = empty_cells(&self.container.peers.snapshot(), &layout),
            fan_out = config.elastic.fan_out,
            "Node started"
        );
        Ok(())
    }

    fn spawn_outbox(&self, mut outbox: mpsc::UnboundedReceiver<Outbound>) {
        let node = Arc::clone(&self.container.node);
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    next = outbox.recv() => {
                        let Some(Outbound { peer, message }) = next else { break };
                        if let Err(err) = node.send_to(&peer, &message).await {
                            debug!(peer = %peer.address.short(), error = %err, "Reply not sent");
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("[outbox] Shutdown signal received");
                        break;
                    }
                }
            }
        });
    }

    fn spawn_pinger(&self, period: Duration) {
        let node = Arc::clone(&self.container.node);
        let handler = Arc::clone(&self.container.handler);
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        handler.expire(period * PING_RETENTION_INTERVALS);

                        let ping = match handler.ping() {
                            Ok(ping) => ping,
                            Err(err) => {
                                warn!(error = %err, "Failed to build ping");
                                continue;
                            }
                        };
                        match node.send_all(&ping).await {
                            Ok(report) => info!(
                                message_id = %ping.id(),
                                layout = %report.layout,
                                mode = ?report.mode,
                                attempts = report.attempts,
                                delivered = report.delivered,
                                "Ping broadcast"
                            ),
                            Err(err) => warn!(error = %err, "Ping broadcast failed"),
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("[pinger] Shutdown signal received");
                        break;
                    }
                }
            }
        });
    }

    /// Signal every task to stop.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        let _ = self.shutdown_tx.send(true);
        // Let tasks observe the signal before the runtime drops them.
        tokio::time::sleep(Duration::from_millis(100)).await;
        info!("Shutdown complete");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = NodeConfig::load().context("Failed to load configuration")?;
    debug!(?config, "Configuration loaded");

    let mut runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
