//! Directory port consumed by the dissemination engine.

use crate::PeerEntry;
use eg_01_elastic_grid::{Elastic3D, ElasticLayout};
use shared_types::Address;

/// Peer directory interface.
///
/// Implementations must make each call atomic with respect to every other
/// call: a query sees the entry set either before or after a mutation, never
/// in between.
pub trait PeerDirectory: Send + Sync {
    /// Insert or replace the entry for `peer.address`.
    fn append(&self, peer: PeerEntry);

    /// Remove the entry for `address`, returning it if present.
    fn remove(&self, address: &Address) -> Option<PeerEntry>;

    /// Drop every entry.
    fn clear(&self);

    fn find(&self, address: &Address) -> Option<PeerEntry>;

    fn exists(&self, address: &Address) -> bool;

    fn count(&self) -> usize;

    /// All entries, in no particular order.
    fn snapshot(&self) -> Vec<PeerEntry>;

    /// Every entry whose cell under `layout` is contained by `coord`.
    fn query_by_coordinate(&self, coord: &Elastic3D, layout: &ElasticLayout) -> Vec<PeerEntry>;
}
