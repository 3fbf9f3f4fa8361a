//! Ports (hexagonal boundaries) of the dissemination engine.

pub mod inbound;
pub mod outbound;
