//! # Catalog Client
//!
//! Keeps the peer directory in step with the catalog service over one
//! persistent, length-prefixed TCP connection.
//!
//! ## Protocol
//!
//! | direction        | `action`   | body                                   |
//! |------------------|------------|----------------------------------------|
//! | node → catalog   | `register` | `enode`: this node's enode             |
//! | catalog → node   | `update`   | `peers`: list of enode strings         |
//!
//! `register` is signed by the node key and sent on every (re)connect.
//! `update` must be signed by the configured master address; each one
//! replaces the whole directory. A lost connection is retried every
//! `reconnect_secs` until shutdown.

use crate::container::{CatalogConfig, ConfigError};
use eg_01_elastic_grid::{define_layout, ElasticLayout};
use eg_02_peer_directory::{PeerDirectory, PeerEntry, PeerList};
use eg_03_messages::{Message, MessageError, Value};
use eg_04_dissemination::TransportError;
use eg_05_tcp_transport::{encode_frame, FrameDecoder, TransportConfig};
use shared_crypto::NodeKey;
use shared_types::Address;
use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const ACTION_REGISTER: &str = "register";
pub const ACTION_UPDATE: &str = "update";

const ENODE: &str = "enode";
const PEERS: &str = "peers";

const READ_CHUNK: usize = 8 * 1024;

/// Catalog failures. None of them stop the client; they are logged and the
/// connection is retried.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unexpected catalog action: {0:?}")]
    UnexpectedAction(Option<String>),

    #[error("Snapshot signed by {signer}, not the master key")]
    UntrustedSigner { signer: Address },

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(&'static str),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Catalog connection: {0}")]
    Io(#[from] io::Error),
}

/// Registers this node with the catalog and applies its snapshots.
pub struct CatalogClient {
    endpoint: String,
    master: Address,
    reconnect: Duration,
    key: NodeKey,
    local: PeerEntry,
    peers: Arc<PeerList>,
    fan_out: u8,
    transport: TransportConfig,
}

impl CatalogClient {
    pub fn new(
        config: &CatalogConfig,
        key: NodeKey,
        local: PeerEntry,
        peers: Arc<PeerList>,
        fan_out: u8,
        transport: TransportConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: config.endpoint.clone(),
            master: config.master()?,
            reconnect: config.reconnect_interval(),
            key,
            local,
            peers,
            fan_out,
            transport,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Signed `register` message announcing this node's enode.
    pub fn register_message(&self) -> Result<Message, MessageError> {
        Message::builder()
            .action(ACTION_REGISTER)
            .body(ENODE, self.local.to_enode())
            .build(&self.key)
    }

    /// Apply one message received from the catalog. Returns the directory
    /// size after the update.
    ///
    /// Entries that fail to parse are skipped. This node is always kept.
    pub fn apply_update(&self, message: &Message) -> Result<usize, CatalogError> {
        if message.action() != Some(ACTION_UPDATE) {
            return Err(CatalogError::UnexpectedAction(
                message.action().map(str::to_string),
            ));
        }
        if !message.verify(&self.master) {
            let signer = message.sender()?;
            return Err(CatalogError::UntrustedSigner { signer });
        }

        let listed = message
            .value(PEERS)
            .and_then(Value::as_list)
            .ok_or(CatalogError::InvalidSnapshot("missing peers list"))?;

        let mut entries = Vec::with_capacity(listed.len() + 1);
        for value in listed {
            let Some(enode) = value.as_str() else {
                warn!("Skipping non-string catalog entry");
                continue;
            };
            match PeerEntry::from_enode(enode) {
                Ok(peer) if peer.address == self.local.address => {}
                Ok(peer) => entries.push(peer),
                Err(err) => warn!(%enode, error = %err, "Skipping invalid catalog entry"),
            }
        }
        entries.push(self.local.clone());

        let layout = define_layout(entries.len(), self.fan_out);
        let empty = empty_cells(&entries, &layout);
        self.peers.update(entries);

        let count = self.peers.count();
        info!(peers = count, %layout, empty_cells = empty, "Peer directory updated from catalog");
        Ok(count)
    }

    /// Keep a catalog session alive until `shutdown` flips.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            match self.session(&mut shutdown).await {
                Ok(()) => debug!(endpoint = %self.endpoint, "Catalog disconnected"),
                Err(err) => warn!(endpoint = %self.endpoint, error = %err, "Catalog unavailable"),
            }
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect) => {}
                _ = shutdown.changed() => break,
            }
        }
        info!("[catalog] Shutdown signal received");
    }

    /// One connection: register, then apply snapshots until it closes.
    async fn session(&self, shutdown: &mut watch::Receiver<bool>) -> Result<(), CatalogError> {
        let mut stream = timeout(
            self.transport.connect_timeout(),
            TcpStream::connect(&self.endpoint),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.endpoint.clone()))??;
        info!(endpoint = %self.endpoint, "Catalog connected");

        let register = self.register_message()?.encode()?;
        let frame = encode_frame(&register, self.transport.max_frame_size)?;
        stream.write_all(&frame).await?;

        let mut decoder = FrameDecoder::new(self.transport.max_frame_size);
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let n = tokio::select! {
                read = stream.read(&mut chunk) => read?,
                _ = shutdown.changed() => return Ok(()),
            };
            if n == 0 {
                return Ok(());
            }

            decoder.push(&chunk[..n]);
            while let Some(frame) = decoder.next_frame()? {
                let applied = Message::decode(&frame)
                    .map_err(CatalogError::from)
                    .and_then(|message| self.apply_update(&message));
                if let Err(err) = applied {
                    warn!(error = %err, "Catalog message rejected");
                }
            }
        }
    }
}

/// Cells of `layout` with no member among `peers`. Relay hops into them find
/// no candidates.
pub fn empty_cells(peers: &[PeerEntry], layout: &ElasticLayout) -> usize {
    let occupied: HashSet<_> = peers.iter().map(|peer| peer.coordinates(layout)).collect();
    layout.cells().filter(|cell| !occupied.contains(cell)).count()
}
