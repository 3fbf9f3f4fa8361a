//! Cross-crate flows.

mod coverage;
mod security;
mod tcp_cluster;
