//! Inbound ports (API) for the dissemination engine.

use async_trait::async_trait;
use std::net::SocketAddr;
use tracing::trace;

/// Transport lifecycle and frame callbacks.
///
/// Implemented by the engine, driven by a transport server.
#[async_trait]
pub trait TransportEvents: Send + Sync {
    /// Outbound connection established.
    fn on_connect(&self, remote: SocketAddr) {
        trace!(%remote, "Connected");
    }

    /// Inbound connection accepted.
    fn on_accept(&self, remote: SocketAddr) {
        trace!(%remote, "Accepted");
    }

    /// One complete frame received from `remote`.
    async fn on_message(&self, remote: SocketAddr, frame: Vec<u8>);

    /// Connection closed, by either side.
    fn on_close(&self, remote: SocketAddr) {
        trace!(%remote, "Closed");
    }
}
