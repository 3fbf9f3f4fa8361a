//! # Domain Layer for the Elastic Grid
//!
//! Pure, synchronous value types and functions. No I/O.
//!
//! - **coordinates**: `Elastic3D` points and `ElasticLayout` dimensions
//! - **services**: `define_layout`, `define_coordinates`

mod coordinates;
mod services;

pub use coordinates::*;
pub use services::*;
