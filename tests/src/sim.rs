//! # In-Memory Grid Simulation
//!
//! Runs many [`ElasticNode`]s in one process. Frames travel through per-node
//! inboxes instead of sockets; each node drains its inbox on its own task,
//! exactly as the TCP server would feed it.
//!
//! Every frame in flight is counted, so [`SimNetwork::settle`] can wait until
//! a broadcast has fully propagated. Frames still carrying a live routing
//! header are counted apart from terminal deliveries.

use async_trait::async_trait;
use eg_02_peer_directory::{PeerEntry, PeerList};
use eg_03_messages::Message;
use eg_04_dissemination::{
    DisseminationError, ElasticConfig, ElasticNode, MessageHandler, Transport, TransportError,
};
use parking_lot::{Mutex, RwLock};
use shared_crypto::NodeKey;
use shared_types::Address;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Engine type used by every simulated node.
pub type SimEngine = ElasticNode<PeerList, SimTransport, RecordingHandler>;

const SETTLE_POLL: Duration = Duration::from_millis(5);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(20);

// =============================================================================
// Router
// =============================================================================

/// Shared switchboard: endpoint → inbox.
#[derive(Default)]
pub struct SimRouter {
    inboxes: RwLock<HashMap<String, mpsc::UnboundedSender<Vec<u8>>>>,
    down: RwLock<HashSet<String>>,
    in_flight: AtomicUsize,
    frames: AtomicUsize,
    routed: AtomicUsize,
    errors: Mutex<Vec<DisseminationError>>,
}

impl SimRouter {
    fn deliver(&self, endpoint: &str, frame: Vec<u8>) -> Result<(), TransportError> {
        let refused = || TransportError::Connect {
            endpoint: endpoint.to_string(),
            reason: "connection refused".to_string(),
        };

        if self.down.read().contains(endpoint) {
            return Err(refused());
        }
        let inboxes = self.inboxes.read();
        let inbox = inboxes.get(endpoint).ok_or_else(refused)?;
        let routed = Message::decode(&frame).is_ok_and(|message| message.should_route());

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if inbox.send(frame).is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(TransportError::Closed);
        }
        self.frames.fetch_add(1, Ordering::SeqCst);
        if routed {
            self.routed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// [`Transport`] backed by the [`SimRouter`].
pub struct SimTransport {
    router: Arc<SimRouter>,
}

#[async_trait]
impl Transport for SimTransport {
    async fn send(&self, peer: &PeerEntry, frame: Vec<u8>) -> Result<(), TransportError> {
        self.router.deliver(&peer.endpoint(), frame)
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Records every authenticated message handed to the application.
#[derive(Default)]
pub struct RecordingHandler {
    received: Mutex<Vec<(Address, String)>>,
}

impl RecordingHandler {
    /// How many times message `id` reached this node.
    pub fn count(&self, id: &str) -> usize {
        self.received
            .lock()
            .iter()
            .filter(|(_, received)| received == id)
            .count()
    }

    pub fn total(&self) -> usize {
        self.received.lock().len()
    }
}

impl MessageHandler for RecordingHandler {
    fn on_message(&self, peer: &PeerEntry, message: &Message) {
        self.received.lock().push((peer.address, message.id()));
    }
}

// =============================================================================
// Network
// =============================================================================

pub struct SimNode {
    pub key: NodeKey,
    pub entry: PeerEntry,
    pub engine: Arc<SimEngine>,
    pub handler: Arc<RecordingHandler>,
}

/// A fleet of nodes sharing one peer directory.
pub struct SimNetwork {
    router: Arc<SimRouter>,
    peers: Arc<PeerList>,
    nodes: Vec<SimNode>,
}

impl SimNetwork {
    /// Start `count` nodes. Must be called inside a tokio runtime.
    pub fn new(count: usize, config: ElasticConfig) -> Result<Self, DisseminationError> {
        let router = Arc::new(SimRouter::default());
        let keys: Vec<NodeKey> = (0..count).map(|_| NodeKey::generate()).collect();
        let entries: Vec<PeerEntry> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| PeerEntry::new(key.address(), "sim", 10_000 + i as u16))
            .collect();
        let peers = Arc::new(PeerList::with_peers(entries.iter().cloned()));

        let mut nodes = Vec::with_capacity(count);
        for (key, entry) in keys.into_iter().zip(entries) {
            let handler = Arc::new(RecordingHandler::default());
            let transport = Arc::new(SimTransport {
                router: Arc::clone(&router),
            });
            let engine = Arc::new(ElasticNode::new(
                config.clone(),
                key.clone(),
                Arc::clone(&peers),
                transport,
                Arc::clone(&handler),
            )?);
            spawn_inbox(&router, &entry, Arc::clone(&engine));
            nodes.push(SimNode {
                key,
                entry,
                engine,
                handler,
            });
        }

        Ok(Self {
            router,
            peers,
            nodes,
        })
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &SimNode {
        &self.nodes[index]
    }

    pub fn peers(&self) -> &Arc<PeerList> {
        &self.peers
    }

    /// Make `node` refuse every connection.
    pub fn take_down(&self, index: usize) {
        self.router
            .down
            .write()
            .insert(self.nodes[index].entry.endpoint());
    }

    /// Frames accepted by the router so far.
    pub fn frames(&self) -> usize {
        self.router.frames.load(Ordering::SeqCst)
    }

    /// Accepted frames that were relay hops (ttl > 0).
    pub fn routed_frames(&self) -> usize {
        self.router.routed.load(Ordering::SeqCst)
    }

    /// Nodes whose application saw message `id`, and how often in total.
    pub fn coverage(&self, id: &str) -> (usize, usize) {
        let counts: Vec<usize> = self.nodes.iter().map(|n| n.handler.count(id)).collect();
        let reached = counts.iter().filter(|&&c| c > 0).count();
        (reached, counts.iter().sum())
    }

    /// Errors returned by `on_receive` on any node, drained.
    pub fn take_errors(&self) -> Vec<DisseminationError> {
        std::mem::take(&mut *self.router.errors.lock())
    }

    /// Hand a raw frame to node `index` as if it arrived from the wire.
    pub fn inject(&self, index: usize, frame: Vec<u8>) -> Result<(), TransportError> {
        self.router.deliver(&self.nodes[index].entry.endpoint(), frame)
    }

    /// Wait until no frame is queued or being handled. False on timeout.
    pub async fn settle(&self) -> bool {
        tokio::time::timeout(SETTLE_TIMEOUT, async {
            while self.router.in_flight.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(SETTLE_POLL).await;
            }
        })
        .await
        .is_ok()
    }
}

fn spawn_inbox(router: &Arc<SimRouter>, entry: &PeerEntry, engine: Arc<SimEngine>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    router.inboxes.write().insert(entry.endpoint(), tx);

    let router = Arc::clone(router);
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(err) = engine.on_receive(&frame).await {
                router.errors.lock().push(err);
            }
            router.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    });
}
