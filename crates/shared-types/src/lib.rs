//! # Shared Types Crate
//!
//! Identity and digest types shared across the Elastic Grid subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Address` and `Hash` are defined once here and
//!   reused by the grid, the peer directory, the message envelope and the
//!   dissemination engine.
//! - **Canonical Text Form**: addresses travel on the wire as EIP-55 checksum
//!   hex strings, and are accepted back in any case.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
