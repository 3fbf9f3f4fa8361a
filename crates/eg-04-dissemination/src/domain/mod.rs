//! # Domain Layer for Dissemination
//!
//! Pure business logic with no I/O.
//!
//! - **config**: `ElasticConfig`
//! - **planning**: axis rounds, drill-down steps, relay candidate selection
//! - **outcomes**: reports returned by the engine

mod config;
mod outcomes;
mod planning;

pub use config::*;
pub use outcomes::*;
pub use planning::*;
