//! # Broadcast Coverage
//!
//! A broadcast from any node reaches the application of every node in the
//! directory exactly once, whatever the layout:
//!
//! | peers | fan-out | layout     | rounds      |
//! |-------|---------|------------|-------------|
//! | 10    | 16      | (1,1,1)    | direct      |
//! | 50    | 16      | (4,1,1)    | X           |
//! | 300   | 16      | (10,2,1)   | Y → X       |
//! | 100   | 4       | (4,4,2)    | Z → Y → X   |

#[cfg(test)]
mod tests {
    use crate::sim::SimNetwork;
    use eg_01_elastic_grid::{Elastic3D, ElasticLayout};
    use eg_02_peer_directory::PeerDirectory;
    use eg_03_messages::Message;
    use eg_04_dissemination::{BroadcastMode, ElasticConfig};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn config(fan_out: u8) -> ElasticConfig {
        ElasticConfig {
            fan_out,
            ..Default::default()
        }
    }

    fn layout(x: u8, y: u8, z: u8) -> ElasticLayout {
        ElasticLayout::new(x, y, z).unwrap()
    }

    fn ping(net: &SimNetwork, from: usize, seq: i64) -> Message {
        Message::builder()
            .action("ping")
            .body("seq", seq)
            .build(&net.node(from).key)
            .unwrap()
    }

    fn occupied(net: &SimNetwork, layout: &ElasticLayout, at: Elastic3D) -> bool {
        !net.peers().query_by_coordinate(&at, layout).is_empty()
    }

    /// Relay hops and occupied cells of a Y → X broadcast (z = 1) when every
    /// send succeeds. The origin handles its own row and every row relay its
    /// own cell locally, so each occupied row but one costs a Y hop and each
    /// occupied cell but one per row costs an X hop.
    fn expected_hops(net: &SimNetwork, layout: &ElasticLayout) -> (usize, usize) {
        let mut rows = 0;
        let mut x_hops = 0;
        let mut cells = 0;
        for y in 1..=layout.y() {
            if !occupied(net, layout, Elastic3D::new(0, y, 1)) {
                continue;
            }
            let in_row = (1..=layout.x())
                .filter(|&x| occupied(net, layout, Elastic3D::new(x, y, 1)))
                .count();
            rows += 1;
            x_hops += in_row - 1;
            cells += in_row;
        }
        (rows - 1 + x_hops, cells)
    }

    // =========================================================================
    // DIRECT MODE
    // =========================================================================

    #[tokio::test]
    async fn test_single_cell_sends_directly() {
        let net = SimNetwork::new(10, config(16)).unwrap();
        let message = ping(&net, 0, 1);

        let report = net.node(0).engine.send_all(&message).await.unwrap();
        assert!(net.settle().await);

        assert_eq!(report.layout, ElasticLayout::UNIT);
        assert_eq!(report.mode, BroadcastMode::Direct);
        assert_eq!(report.attempts, 10);
        assert_eq!(report.delivered, 10);
        assert_eq!(net.coverage(&message.id()), (10, 10));
        // The author is served locally.
        assert_eq!(net.frames(), 9);
        assert!(net.take_errors().is_empty());
    }

    // =========================================================================
    // ROUTED MODE
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fifty_peers_single_x_round() {
        let net = SimNetwork::new(50, config(16)).unwrap();
        let message = ping(&net, 0, 1);

        let report = net.node(0).engine.send_all(&message).await.unwrap();
        assert!(net.settle().await);

        assert_eq!(report.layout, layout(4, 1, 1));
        assert_eq!(report.mode, BroadcastMode::Routed);
        assert_eq!(report.attempts, 4);
        assert_eq!(net.coverage(&message.id()), (50, 50));

        let (hops, cells) = expected_hops(&net, &report.layout);
        assert_eq!(net.routed_frames(), hops);
        assert_eq!(net.frames() - net.routed_frames(), 50 - cells);
        assert!(net.take_errors().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_three_hundred_peers_y_then_x() {
        let net = SimNetwork::new(300, config(16)).unwrap();
        let message = ping(&net, 17, 1);

        let report = net.node(17).engine.send_all(&message).await.unwrap();
        assert!(net.settle().await);

        assert_eq!(report.layout, layout(10, 2, 1));
        assert_eq!(report.attempts, 2);
        assert_eq!(net.coverage(&message.id()), (300, 300));

        // Exactly one hop per remote row and remote cell, then one terminal
        // frame per member that is not its cell's relay.
        let (hops, cells) = expected_hops(&net, &report.layout);
        assert!(hops <= 1 + 2 * 9);
        assert_eq!(net.routed_frames(), hops);
        assert_eq!(net.frames() - net.routed_frames(), 300 - cells);
        assert!(net.take_errors().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_small_fan_out_uses_all_three_axes() {
        let net = SimNetwork::new(100, config(4)).unwrap();
        let message = ping(&net, 3, 1);

        let report = net.node(3).engine.send_all(&message).await.unwrap();
        assert!(net.settle().await);

        assert_eq!(report.layout, layout(4, 4, 2));
        assert_eq!(report.attempts, 2);
        assert_eq!(net.coverage(&message.id()), (100, 100));
        assert!(net.take_errors().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_any_node_can_originate() {
        let net = SimNetwork::new(40, config(4)).unwrap();

        let mut ids = Vec::new();
        for (seq, origin) in [0usize, 9, 21, 33, 39].into_iter().enumerate() {
            let message = ping(&net, origin, seq as i64);
            net.node(origin).engine.send_all(&message).await.unwrap();
            ids.push(message.id());
        }
        assert!(net.settle().await);

        for id in &ids {
            assert_eq!(net.coverage(id), (40, 40));
        }
        for node in net.nodes() {
            assert_eq!(node.handler.total(), ids.len());
        }
    }

    // =========================================================================
    // FAILURES
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unreachable_peer_only_misses_itself() {
        let net = SimNetwork::new(50, config(16)).unwrap();
        net.take_down(7);
        let message = ping(&net, 0, 1);

        net.node(0).engine.send_all(&message).await.unwrap();
        assert!(net.settle().await);

        // Relay failover routes around the dead peer.
        assert_eq!(net.coverage(&message.id()), (49, 49));
        assert_eq!(net.node(7).handler.total(), 0);
    }

    #[tokio::test]
    async fn test_directory_change_between_broadcasts_changes_layout() {
        use eg_02_peer_directory::PeerEntry;
        use shared_crypto::NodeKey;

        let net = SimNetwork::new(16, config(16)).unwrap();
        assert_eq!(net.node(0).engine.current_layout(), ElasticLayout::UNIT);

        // One more (unreachable) peer pushes the grid to two cells.
        net.peers()
            .append(PeerEntry::new(NodeKey::generate().address(), "nowhere", 1));

        assert_eq!(net.node(0).engine.current_layout(), layout(2, 1, 1));
    }
}
