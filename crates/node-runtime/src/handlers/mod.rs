//! # Application Handlers
//!
//! Handlers receiving authenticated direct messages from the engine.

pub mod ping_pong;

pub use ping_pong::{Outbound, PingPongHandler, ACTION_PING, ACTION_PONG};
