//! # Node Container
//!
//! Holds the wired components of one grid node.
//!
//! ## Wiring
//!
//! ```text
//! NodeConfig ──→ NodeKey ─────────────┐
//!            ──→ PeerList (+ self) ───┼──→ ElasticNode ──→ TcpTransport
//!            ──→ PingPongHandler ─────┘         ↑
//!                     │ outbox                  │ TransportEvents
//!                     ↓                         │
//!               runtime send_to          TcpFrameServer
//!
//! CatalogClient ──update──→ PeerList   (only with a [catalog] section)
//! ```

use super::NodeConfig;
use crate::adapters::CatalogClient;
use crate::handlers::{Outbound, PingPongHandler};
use anyhow::{Context, Result};
use eg_02_peer_directory::{PeerDirectory, PeerEntry, PeerList};
use eg_04_dissemination::ElasticNode;
use eg_05_tcp_transport::TcpTransport;
use shared_crypto::NodeKey;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// The engine as hosted by this binary.
pub type GridNode = ElasticNode<PeerList, TcpTransport, PingPongHandler>;

pub struct NodeContainer {
    pub config: NodeConfig,
    /// This node's own directory entry.
    pub local: PeerEntry,
    pub peers: Arc<PeerList>,
    pub handler: Arc<PingPongHandler>,
    pub node: Arc<GridNode>,
    pub catalog: Option<Arc<CatalogClient>>,
}

impl NodeContainer {
    /// Build every component from `config`.
    ///
    /// Returns the container and the receiving end of the handler's outbox.
    pub fn new(config: NodeConfig) -> Result<(Self, mpsc::UnboundedReceiver<Outbound>)> {
        let key = load_key(&config)?;
        let local = PeerEntry::new(key.address(), config.network.host.clone(), config.network.port);

        let peers = Arc::new(PeerList::with_peers(seed_peers(&config.peers)));
        peers.append(local.clone());
        info!(peers = peers.count(), "Peer directory seeded");

        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let handler = Arc::new(PingPongHandler::new(key.clone(), outbox_tx));
        let transport = Arc::new(TcpTransport::new(config.transport.clone()));

        let catalog = config
            .catalog
            .as_ref()
            .map(|catalog| {
                CatalogClient::new(
                    catalog,
                    key.clone(),
                    local.clone(),
                    Arc::clone(&peers),
                    config.elastic.fan_out,
                    config.transport.clone(),
                )
                .map(Arc::new)
            })
            .transpose()
            .context("Invalid catalog configuration")?;

        let node = ElasticNode::new(
            config.elastic.clone(),
            key,
            Arc::clone(&peers),
            transport,
            Arc::clone(&handler),
        )
        .context("Failed to create elastic node")?;

        Ok((
            Self {
                config,
                local,
                peers,
                handler,
                node: Arc::new(node),
                catalog,
            },
            outbox_rx,
        ))
    }
}

fn load_key(config: &NodeConfig) -> Result<NodeKey> {
    match config.node_key.as_deref() {
        Some(secret) => NodeKey::from_hex(secret).context("Invalid node_key"),
        None => {
            let key = NodeKey::generate();
            info!(address = %key.address(), "Generated ephemeral node key");
            Ok(key)
        }
    }
}

fn seed_peers(enodes: &[String]) -> Vec<PeerEntry> {
    enodes
        .iter()
        .filter_map(|enode| match PeerEntry::from_enode(enode) {
            Ok(peer) => Some(peer),
            Err(err) => {
                warn!(%enode, error = %err, "Skipping invalid peer");
                None
            }
        })
        .collect()
}
