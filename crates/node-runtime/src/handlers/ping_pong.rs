//! # Ping / Pong
//!
//! Liveness probe over the grid. A broadcast `ping` reaches every peer; each
//! answers its author with a direct `pong` naming the ping it saw:
//!
//! | field      | value                           |
//! |------------|---------------------------------|
//! | `msgHash`  | id of the ping                  |
//! | `msgBytes` | encoded size of the ping        |
//! | `msgTime`  | `_timestamp` of the ping        |
//!
//! The handler runs inside the engine's receive path, so replies are not sent
//! from here: they are queued on an outbox drained by the runtime.

use eg_02_peer_directory::PeerEntry;
use eg_03_messages::{Message, MessageError};
use eg_04_dissemination::MessageHandler;
use parking_lot::Mutex;
use shared_crypto::NodeKey;
use shared_types::Address;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const ACTION_PING: &str = "ping";
pub const ACTION_PONG: &str = "pong";

const MSG_HASH: &str = "msgHash";
const MSG_BYTES: &str = "msgBytes";
const MSG_TIME: &str = "msgTime";

/// A reply waiting to be sent directly to `peer`.
#[derive(Debug)]
pub struct Outbound {
    pub peer: PeerEntry,
    pub message: Message,
}

/// Pings sent by this node and who has answered them.
#[derive(Debug)]
struct PendingPing {
    sent_at: Instant,
    responders: HashSet<Address>,
}

pub struct PingPongHandler {
    key: NodeKey,
    outbox: mpsc::UnboundedSender<Outbound>,
    pings: Mutex<HashMap<String, PendingPing>>,
}

impl PingPongHandler {
    pub fn new(key: NodeKey, outbox: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            key,
            outbox,
            pings: Mutex::new(HashMap::new()),
        }
    }

    /// Build a signed ping and start tracking its pongs.
    pub fn ping(&self) -> Result<Message, MessageError> {
        let ping = Message::builder().action(ACTION_PING).build(&self.key)?;
        self.pings.lock().insert(
            ping.id(),
            PendingPing {
                sent_at: Instant::now(),
                responders: HashSet::new(),
            },
        );
        Ok(ping)
    }

    /// Distinct peers that answered ping `id`.
    pub fn responders(&self, id: &str) -> usize {
        self.pings
            .lock()
            .get(id)
            .map_or(0, |ping| ping.responders.len())
    }

    /// Forget pings older than `max_age`.
    pub fn expire(&self, max_age: Duration) -> usize {
        let mut pings = self.pings.lock();
        let before = pings.len();
        pings.retain(|_, ping| ping.sent_at.elapsed() < max_age);
        before - pings.len()
    }

    fn pong_for(&self, ping: &Message) -> Result<Message, MessageError> {
        let bytes = i64::try_from(ping.encoded_len()?).unwrap_or(i64::MAX);
        Message::builder()
            .action(ACTION_PONG)
            .body(MSG_HASH, ping.id())
            .body(MSG_BYTES, bytes)
            .body(MSG_TIME, ping.timestamp().unwrap_or_default())
            .build(&self.key)
    }

    fn on_ping(&self, peer: &PeerEntry, ping: &Message) {
        let pong = match self.pong_for(ping) {
            Ok(pong) => pong,
            Err(err) => {
                warn!(error = %err, "Failed to build pong");
                return;
            }
        };

        let outbound = Outbound {
            peer: peer.clone(),
            message: pong,
        };
        if self.outbox.send(outbound).is_err() {
            debug!("Outbox closed, pong dropped");
        }
    }

    fn on_pong(&self, peer: &PeerEntry, pong: &Message) {
        let Some(id) = pong.value(MSG_HASH).and_then(|v| v.as_str()) else {
            warn!(peer = %peer.address.short(), "Pong without msgHash");
            return;
        };

        let mut pings = self.pings.lock();
        let Some(ping) = pings.get_mut(id) else {
            debug!(peer = %peer.address.short(), message_id = %id, "Pong for unknown ping");
            return;
        };

        if ping.responders.insert(peer.address) {
            info!(
                peer = %peer.address.short(),
                message_id = %id,
                bytes = pong.value(MSG_BYTES).and_then(|v| v.as_int()).unwrap_or_default(),
                rtt_ms = ping.sent_at.elapsed().as_millis() as u64,
                responders = ping.responders.len(),
                "Pong"
            );
        }
    }
}

impl MessageHandler for PingPongHandler {
    fn on_message(&self, peer: &PeerEntry, message: &Message) {
        match message.action() {
            Some(ACTION_PING) => self.on_ping(peer, message),
            Some(ACTION_PONG) => self.on_pong(peer, message),
            other => debug!(
                peer = %peer.address.short(),
                action = ?other,
                "Ignoring message"
            ),
        }
    }
}
