//! # Peer Directory (eg-02)
//!
//! Registry of known peers, keyed by account address, that the dissemination
//! engine queries by grid coordinate.
//!
//! ## Architecture Role
//!
//! ```text
//! [catalog snapshot / registration] ──update/append──→ [PeerList]
//!                                                          │
//!                         query_by_coordinate(to, layout)  ↓
//!                                                 [Dissemination (eg-04)]
//! ```
//!
//! ## Concurrency
//!
//! One `RwLock` guards the whole entry map. Every operation takes the lock
//! exactly once, so a query never observes a half-applied `update`.

pub mod domain;
pub mod errors;
pub mod peer_list;
pub mod ports;

pub use domain::*;
pub use errors::PeerDirectoryError;
pub use peer_list::PeerList;
pub use ports::PeerDirectory;
