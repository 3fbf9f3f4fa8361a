//! Domain types for the peer directory.

mod entry;

pub use entry::*;
