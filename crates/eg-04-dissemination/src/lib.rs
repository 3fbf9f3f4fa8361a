//! # Dissemination Engine (eg-04)
//!
//! Delivers one message to every peer in the directory through the elastic
//! grid, in `X + Y + Z` relay sends rather than one send per peer.
//!
//! ## Architecture Role
//!
//! ```text
//! send_all ──Z round (ttl 3)──→ relay in slice z
//!                                   │ on_receive
//!                                   ↓ Y round (ttl 2)
//!                               relay in row (y, z)
//!                                   │ on_receive
//!                                   ↓ X round (ttl 1)
//!                               relay in cell (x, y, z)
//!                                   │ on_receive (terminal)
//!                                   ↓ direct push, routing header removed
//!                               every peer in the cell → MessageHandler
//! ```
//!
//! Outer rounds are skipped when their axis has size 1; a layout with a
//! single cell bypasses the grid and sends directly to every peer.
//!
//! ## Security
//!
//! - Relay hops are accepted only from routers present in the peer directory
//!   whose `routerSig` recovers to the claimed router address.
//! - Direct messages are dispatched only when the author is a known peer and
//!   the author signature recovers to `_sender`.
//! - Rejected messages are logged and dropped; nothing is retried.

pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

pub use domain::*;
pub use events::{DisseminationError, TransportError};
pub use ports::inbound::TransportEvents;
pub use ports::outbound::{MessageHandler, Transport};
pub use service::ElasticNode;
