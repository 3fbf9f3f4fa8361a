//! Outbound ports (SPI) for the dissemination engine.

use crate::events::TransportError;
use async_trait::async_trait;
use eg_02_peer_directory::PeerEntry;
use eg_03_messages::Message;

/// Framed byte transport.
///
/// `send` resolves once the frame has been handed to the peer, or fails; the
/// relay failover loop moves on to the next candidate on failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, peer: &PeerEntry, frame: Vec<u8>) -> Result<(), TransportError>;
}

/// Application handler for authenticated, direct (un-routed) messages.
pub trait MessageHandler: Send + Sync {
    /// `peer` is the directory entry of the message author.
    fn on_message(&self, peer: &PeerEntry, message: &Message);
}
