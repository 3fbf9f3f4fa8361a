//! # Node Runtime Library
//!
//! Exposes the runtime's configuration, wiring and application handlers for
//! testing. The entry point is the `main.rs` binary.

pub mod adapters;
pub mod container;
pub mod handlers;

pub use adapters::{CatalogClient, CatalogError};
pub use container::{CatalogConfig, ConfigError, GridNode, NodeConfig, NodeContainer};
pub use handlers::{Outbound, PingPongHandler};
