//! # In-Memory Peer List
//!
//! `HashMap<Address, PeerEntry>` behind a single `parking_lot::RwLock`.

use crate::{PeerDirectory, PeerEntry};
use eg_01_elastic_grid::{define_coordinates, Elastic3D, ElasticLayout};
use parking_lot::RwLock;
use shared_types::Address;
use std::collections::HashMap;
use tracing::debug;

/// Shared peer registry owned by the hosting node.
#[derive(Debug, Default)]
pub struct PeerList {
    peers: RwLock<HashMap<Address, PeerEntry>>,
}

impl PeerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from initial entries.
    pub fn with_peers(peers: impl IntoIterator<Item = PeerEntry>) -> Self {
        let list = Self::new();
        list.append_many(peers);
        list
    }

    /// Insert many entries under one lock acquisition.
    pub fn append_many(&self, peers: impl IntoIterator<Item = PeerEntry>) {
        let mut map = self.peers.write();
        for peer in peers {
            map.insert(peer.address, peer);
        }
    }

    /// Replace the whole registry with a catalog snapshot.
    pub fn update(&self, peers: impl IntoIterator<Item = PeerEntry>) {
        let fresh: HashMap<Address, PeerEntry> =
            peers.into_iter().map(|peer| (peer.address, peer)).collect();
        let count = fresh.len();

        *self.peers.write() = fresh;
        debug!(peers = count, "Peer list replaced from snapshot");
    }
}

impl PeerDirectory for PeerList {
    fn append(&self, peer: PeerEntry) {
        self.peers.write().insert(peer.address, peer);
    }

    fn remove(&self, address: &Address) -> Option<PeerEntry> {
        self.peers.write().remove(address)
    }

    fn clear(&self) {
        self.peers.write().clear();
    }

    fn find(&self, address: &Address) -> Option<PeerEntry> {
        self.peers.read().get(address).cloned()
    }

    fn exists(&self, address: &Address) -> bool {
        self.peers.read().contains_key(address)
    }

    fn count(&self) -> usize {
        self.peers.read().len()
    }

    fn snapshot(&self) -> Vec<PeerEntry> {
        self.peers.read().values().cloned().collect()
    }

    fn query_by_coordinate(&self, coord: &Elastic3D, layout: &ElasticLayout) -> Vec<PeerEntry> {
        self.peers
            .read()
            .values()
            .filter(|peer| coord.contains(&define_coordinates(layout, &peer.address)))
            .cloned()
            .collect()
    }
}
