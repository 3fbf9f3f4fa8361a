//! # Adapters
//!
//! Connections from the runtime to services outside the grid.

pub mod catalog;

pub use catalog::{empty_cells, CatalogClient, CatalogError, ACTION_REGISTER, ACTION_UPDATE};
