//! Results reported by the engine.
//!
//! None of these is a delivery guarantee; they describe what this node did.

use eg_01_elastic_grid::ElasticLayout;
use shared_types::Address;

/// How `send_all` reached the peer set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastMode {
    /// Single-cell layout: sent straight to every peer.
    Direct,
    /// Fanned out through the grid.
    Routed,
}

/// Summary of one `send_all` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BroadcastReport {
    pub layout: ElasticLayout,
    pub mode: BroadcastMode,
    /// Direct sends (Direct) or relay steps (Routed) attempted.
    pub attempts: usize,
    /// Attempts that were handed to a peer or handled locally.
    pub delivered: usize,
}

/// Result of a single relay step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    /// This node was a candidate and processed the hop itself.
    Local,
    /// Handed to this peer.
    Relayed(Address),
    /// No directory entry lies in the destination.
    NoCandidates,
    /// Every candidate failed at the transport.
    Exhausted,
}

impl RelayOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, RelayOutcome::Local | RelayOutcome::Relayed(_))
    }
}

/// What `on_receive` did with an accepted message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Direct message handed to the application.
    Dispatched { sender: Address },
    /// Relayed one axis further down.
    Relayed { ttl: u8, branches: usize },
    /// Terminal hop pushed to the members of the destination cell.
    Delivered { recipients: usize },
}
