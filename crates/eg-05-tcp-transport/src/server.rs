//! Inbound side: accept loop, one task per connection.

use crate::{FrameDecoder, TransportConfig};
use eg_04_dissemination::TransportEvents;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 8 * 1024;

/// TCP listener feeding received frames into a [`TransportEvents`] sink.
pub struct TcpFrameServer<E: TransportEvents + 'static> {
    listener: TcpListener,
    events: Arc<E>,
    config: TransportConfig,
}

impl<E: TransportEvents + 'static> TcpFrameServer<E> {
    pub async fn bind(
        addr: impl tokio::net::ToSocketAddrs,
        events: Arc<E>,
        config: TransportConfig,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            events,
            config,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` flips to `true` or its sender drops.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "Frame server listening");
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let events = Arc::clone(&self.events);
                        let config = self.config.clone();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            serve_connection(stream, remote, events, config, shutdown).await;
                        });
                    }
                    Err(err) => warn!(error = %err, "Accept failed"),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Frame server shutting down");
                        break;
                    }
                }
            }
        }
    }
}

async fn serve_connection<E: TransportEvents>(
    mut stream: TcpStream,
    remote: SocketAddr,
    events: Arc<E>,
    config: TransportConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    events.on_accept(remote);

    let mut decoder = FrameDecoder::new(config.max_frame_size);
    let mut chunk = vec![0u8; READ_CHUNK];

    'conn: loop {
        let read = tokio::select! {
            read = timeout(config.read_timeout(), stream.read(&mut chunk)) => read,
            _ = shutdown.changed() => break 'conn,
        };

        let n = match read {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => n,
            Ok(Err(err)) => {
                debug!(%remote, error = %err, "Read failed");
                break;
            }
            Err(_) => {
                debug!(%remote, "Idle read timeout");
                break;
            }
        };

        decoder.push(&chunk[..n]);
        loop {
            match decoder.next_frame() {
                Ok(Some(frame)) => events.on_message(remote, frame).await,
                Ok(None) => break,
                Err(err) => {
                    warn!(%remote, error = %err, "Dropping connection");
                    break 'conn;
                }
            }
        }
    }

    if decoder.pending() > 0 {
        debug!(%remote, bytes = decoder.pending(), "Connection closed mid-frame");
    }
    events.on_close(remote);
}
