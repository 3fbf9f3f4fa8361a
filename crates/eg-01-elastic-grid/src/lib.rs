//! # Elastic Grid (eg-01)
//!
//! Maps a peer set onto a virtual 3-D grid sized to the peer count, and maps
//! each peer's address to a cell in that grid.
//!
//! ## Architecture Role
//!
//! ```text
//! peer count ──define_layout──→ ElasticLayout (X, Y, Z)
//!                                     │
//! address ──keccak256──define_coordinates──→ Elastic3D (x, y, z)
//! ```
//!
//! Every node computes the same coordinate for the same address under the same
//! layout, so relays can pick destinations without asking anyone.
//!
//! ## Containment
//!
//! An axis value of `0` is a wildcard. `(0, 0, 3)` contains every cell in the
//! third Z slice; a solid coordinate contains only itself.

pub mod domain;
pub mod errors;

pub use domain::*;
pub use errors::GridError;

/// Default fan-out parameter `n`.
pub const DEFAULT_FAN_OUT: u8 = 16;
