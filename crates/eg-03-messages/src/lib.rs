//! # Messages (eg-03)
//!
//! The signed envelope carried by the elastic grid.
//!
//! ## Wire Layout
//!
//! ```text
//! {
//!   header: { _ver, _signature, [routes: { ttl, to, layout, router, routerSig }], ..app headers }
//!   body:   { ..app fields, _timestamp, _sender }
//! }
//! ```
//!
//! Both regions are binary [`Document`]s encoded with `bincode`. Map keys are
//! ordered, so re-encoding a decoded body reproduces the bytes its author
//! signed.
//!
//! ## Two Signatures
//!
//! - `_signature`: the author's signature over keccak256(body). Never changes.
//! - `routerSig`: the current relay's signature over the same body hash. A new
//!   [`RoutingHeader`] replaces the old one at every hop.

pub mod document;
pub mod errors;
pub mod message;
pub mod routing;

pub use document::{decode_document, encode_document, Document, Value, MAX_DEPTH};
pub use errors::MessageError;
pub use message::{Message, MessageBuilder, ACTION};
pub use routing::RoutingHeader;

/// Protocol version written into `_ver`.
pub const MESSAGE_VERSION: &str = "1.0";
