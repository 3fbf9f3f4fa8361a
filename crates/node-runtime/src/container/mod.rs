//! # Node Container
//!
//! Configuration and the wired node components.

pub mod config;
pub mod node;

pub use config::{CatalogConfig, ConfigError, NetworkConfig, NodeConfig};
pub use node::{GridNode, NodeContainer};
