//! Outbound side: connect, write one frame, close.

use crate::{encode_frame, TransportConfig};
use async_trait::async_trait;
use eg_02_peer_directory::PeerEntry;
use eg_04_dissemination::{Transport, TransportError};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// [`Transport`] over short-lived TCP connections.
#[derive(Clone, Debug, Default)]
pub struct TcpTransport {
    config: TransportConfig,
}

impl TcpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&self, peer: &PeerEntry, payload: Vec<u8>) -> Result<(), TransportError> {
        let frame = encode_frame(&payload, self.config.max_frame_size)?;
        let endpoint = peer.endpoint();

        let mut stream = match timeout(
            self.config.connect_timeout(),
            TcpStream::connect(endpoint.as_str()),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                return Err(TransportError::Connect {
                    endpoint,
                    reason: err.to_string(),
                })
            }
            Err(_) => return Err(TransportError::Timeout(endpoint)),
        };

        let write = async {
            stream.write_all(&frame).await?;
            stream.shutdown().await
        };
        match timeout(self.config.read_timeout(), write).await {
            Ok(result) => result?,
            Err(_) => return Err(TransportError::Timeout(endpoint)),
        }

        trace!(%endpoint, bytes = payload.len(), "Frame sent");
        Ok(())
    }
}
