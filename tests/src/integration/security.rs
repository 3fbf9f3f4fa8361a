//! # Authentication Flows
//!
//! Traffic injected straight into a node's inbox, bypassing the honest send
//! path: strangers, forged routers and tampered bodies must be dropped
//! without reaching the application or the rest of the fleet.

#[cfg(test)]
mod tests {
    use crate::sim::SimNetwork;
    use eg_02_peer_directory::PeerDirectory;
    use eg_03_messages::{decode_document, encode_document, Document, Message, Value};
    use eg_04_dissemination::{DisseminationError, ElasticConfig};
    use shared_crypto::NodeKey;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    const PEERS: usize = 50;

    fn fleet() -> SimNetwork {
        SimNetwork::new(PEERS, ElasticConfig::default()).unwrap()
    }

    fn note(key: &NodeKey) -> Message {
        Message::builder()
            .action("note")
            .body("text", "hello")
            .build(key)
            .unwrap()
    }

    /// Terminal hop into node 0's cell, attested by `router`.
    fn hop_to_node_zero(net: &SimNetwork, message: &Message, router: &NodeKey) -> Message {
        let layout = net.node(0).engine.current_layout();
        let to = net.node(0).entry.coordinates(&layout);
        message.route_to(1, to, layout, router).unwrap()
    }

    /// Decode `message`, let `edit` rewrite the raw document, re-encode.
    fn rewrite(message: &Message, edit: impl FnOnce(&mut Document)) -> Vec<u8> {
        let mut doc = decode_document(&message.encode().unwrap()).unwrap();
        edit(&mut doc);
        encode_document(&doc).unwrap()
    }

    fn section<'a>(doc: &'a mut Document, name: &str) -> &'a mut Document {
        match doc.get_mut(name) {
            Some(Value::Doc(inner)) => inner,
            _ => panic!("missing section {name}"),
        }
    }

    fn nobody_received(net: &SimNetwork) -> bool {
        net.nodes().iter().all(|node| node.handler.total() == 0)
    }

    // =========================================================================
    // DIRECT MESSAGES
    // =========================================================================

    #[tokio::test]
    async fn test_stranger_direct_message_rejected() {
        let net = fleet();
        let stranger = NodeKey::generate();

        net.inject(0, note(&stranger).encode().unwrap()).unwrap();
        assert!(net.settle().await);

        let errors = net.take_errors();
        assert_eq!(errors.len(), 1);
        assert!(
            matches!(&errors[0], DisseminationError::UnknownSender(a) if *a == stranger.address())
        );
        assert!(nobody_received(&net));
    }

    #[tokio::test]
    async fn test_tampered_body_rejected() {
        let net = fleet();
        let author = &net.node(1).key;

        let frame = rewrite(&note(author), |doc| {
            section(doc, "body").insert("text".into(), Value::from("goodbye"));
        });
        net.inject(0, frame).unwrap();
        assert!(net.settle().await);

        let errors = net.take_errors();
        assert!(matches!(
            &errors[..],
            [DisseminationError::InvalidSignature { claimed }] if *claimed == author.address()
        ));
        assert!(nobody_received(&net));
    }

    #[tokio::test]
    async fn test_garbage_frame_is_malformed() {
        let net = fleet();

        net.inject(0, b"definitely not a message".to_vec()).unwrap();
        assert!(net.settle().await);

        let errors = net.take_errors();
        assert!(matches!(&errors[..], [DisseminationError::Malformed(_)]));
    }

    // =========================================================================
    // RELAY HOPS
    // =========================================================================

    #[tokio::test]
    async fn test_member_router_hop_delivered_to_cell() {
        let net = fleet();
        let message = note(&net.node(1).key);
        let hop = hop_to_node_zero(&net, &message, &net.node(2).key);

        let layout = net.node(0).engine.current_layout();
        let cell = net.node(0).entry.coordinates(&layout);
        let members = net.peers().query_by_coordinate(&cell, &layout);

        net.inject(0, hop.encode().unwrap()).unwrap();
        assert!(net.settle().await);

        assert!(net.take_errors().is_empty());
        assert_eq!(net.coverage(&message.id()), (members.len(), members.len()));
        for member in &members {
            let node = net
                .nodes()
                .iter()
                .find(|node| node.entry.address == member.address)
                .unwrap();
            assert_eq!(node.handler.count(&message.id()), 1);
        }
    }

    #[tokio::test]
    async fn test_stranger_router_rejected() {
        let net = fleet();
        let stranger = NodeKey::generate();
        let hop = hop_to_node_zero(&net, &note(&net.node(1).key), &stranger);

        net.inject(0, hop.encode().unwrap()).unwrap();
        assert!(net.settle().await);

        let errors = net.take_errors();
        assert!(matches!(
            &errors[..],
            [DisseminationError::UnauthorizedRouter(r)] if *r == stranger.address()
        ));
        assert!(nobody_received(&net));
    }

    #[tokio::test]
    async fn test_impersonated_router_rejected() {
        let net = fleet();
        let stranger = NodeKey::generate();
        let member = net.node(2).key.address();
        let hop = hop_to_node_zero(&net, &note(&net.node(1).key), &stranger);

        // Claim a member as router while keeping the stranger's signature.
        let frame = rewrite(&hop, |doc| {
            let routes = section(section(doc, "header"), "routes");
            routes.insert("router".into(), Value::from(member.to_checksum_hex()));
        });
        net.inject(0, frame).unwrap();
        assert!(net.settle().await);

        let errors = net.take_errors();
        assert!(matches!(
            &errors[..],
            [DisseminationError::InvalidRouterSignature { router }] if *router == member
        ));
        assert!(nobody_received(&net));
    }

    #[tokio::test]
    async fn test_fleet_keeps_working_after_rejections() {
        let net = fleet();
        let stranger = NodeKey::generate();
        for index in 0..5 {
            net.inject(index, note(&stranger).encode().unwrap()).unwrap();
        }

        let message = note(&net.node(4).key);
        net.node(4).engine.send_all(&message).await.unwrap();
        assert!(net.settle().await);

        assert_eq!(net.take_errors().len(), 5);
        assert_eq!(net.coverage(&message.id()), (PEERS, PEERS));
    }
}
