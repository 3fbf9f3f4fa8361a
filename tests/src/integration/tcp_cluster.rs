//! # TCP Cluster
//!
//! Several full nodes on loopback sockets: frame server, TCP transport,
//! grid engine and the runtime's ping/pong handler. A routed ping must come
//! back as one pong per node.

#[cfg(test)]
mod tests {
    use eg_02_peer_directory::{PeerDirectory, PeerEntry, PeerList};
    use eg_04_dissemination::{BroadcastMode, ElasticConfig, ElasticNode};
    use eg_05_tcp_transport::{TcpFrameServer, TcpTransport, TransportConfig};
    use node_runtime::{GridNode, PingPongHandler};
    use shared_crypto::NodeKey;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{mpsc, watch};

    struct ClusterNode {
        engine: Arc<GridNode>,
        handler: Arc<PingPongHandler>,
    }

    /// Start `count` nodes sharing one directory. Entries are added once each
    /// server knows its port.
    async fn cluster(
        count: usize,
        fan_out: u8,
    ) -> (Vec<ClusterNode>, Arc<PeerList>, watch::Sender<bool>) {
        let peers = Arc::new(PeerList::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = ElasticConfig {
            fan_out,
            ..Default::default()
        };

        let mut nodes = Vec::new();
        for _ in 0..count {
            let key = NodeKey::generate();
            let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel();
            let handler = Arc::new(PingPongHandler::new(key.clone(), outbox_tx));
            let engine = Arc::new(
                ElasticNode::new(
                    config.clone(),
                    key.clone(),
                    Arc::clone(&peers),
                    Arc::new(TcpTransport::default()),
                    Arc::clone(&handler),
                )
                .unwrap(),
            );

            let server = TcpFrameServer::bind(
                "127.0.0.1:0",
                Arc::clone(&engine),
                TransportConfig::default(),
            )
            .await
            .unwrap();
            let addr = server.local_addr().unwrap();
            tokio::spawn(server.run(shutdown_rx.clone()));
            peers.append(PeerEntry::new(key.address(), "127.0.0.1", addr.port()));

            let replies = Arc::clone(&engine);
            tokio::spawn(async move {
                while let Some(out) = outbox_rx.recv().await {
                    let _ = replies.send_to(&out.peer, &out.message).await;
                }
            });

            nodes.push(ClusterNode { engine, handler });
        }

        (nodes, peers, shutdown_tx)
    }

    async fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if done() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        done()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_routed_ping_answered_by_every_node() {
        let (nodes, peers, _shutdown) = cluster(6, 2).await;
        assert_eq!(peers.count(), 6);

        let origin = &nodes[0];
        let ping = origin.handler.ping().unwrap();
        let report = origin.engine.send_all(&ping).await.unwrap();

        assert_eq!(report.mode, BroadcastMode::Routed);
        let id = ping.id();
        assert!(wait_for(|| origin.handler.responders(&id) == 6).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_direct_ping_on_small_fleet() {
        let (nodes, _peers, _shutdown) = cluster(3, 16).await;

        let origin = &nodes[2];
        let ping = origin.handler.ping().unwrap();
        let report = origin.engine.send_all(&ping).await.unwrap();

        assert_eq!(report.mode, BroadcastMode::Direct);
        assert_eq!(report.delivered, 3);
        let id = ping.id();
        assert!(wait_for(|| origin.handler.responders(&id) == 3).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stopped_node_is_routed_around() {
        let (nodes, peers, _shutdown) = cluster(4, 2).await;

        // A directory entry nobody listens on.
        let ghost = NodeKey::generate();
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        peers.append(PeerEntry::new(ghost.address(), "127.0.0.1", port));

        let origin = &nodes[1];
        let ping = origin.handler.ping().unwrap();
        origin.engine.send_all(&ping).await.unwrap();

        let id = ping.id();
        assert!(wait_for(|| origin.handler.responders(&id) == 4).await);
    }
}
