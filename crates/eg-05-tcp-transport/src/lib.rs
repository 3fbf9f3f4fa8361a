//! # TCP Frame Transport (eg-05)
//!
//! Adapter for the dissemination engine's transport ports over plain TCP.
//!
//! ## Frame Format
//!
//! ```text
//! ┌──────────────────────┬───────────────────────────┐
//! │ length: u32 (LE)     │ payload: `length` bytes   │
//! └──────────────────────┴───────────────────────────┘
//! ```
//!
//! ## Components
//!
//! - [`TcpTransport`]: implements `Transport`. One connection per send:
//!   connect, write one frame, close.
//! - [`TcpFrameServer`]: accept loop driving a `TransportEvents` sink, one
//!   task per connection.
//!
//! ## Security
//!
//! - Frames above `max_frame_size` are refused on both ends; nothing is
//!   truncated.
//! - Connect and idle-read timeouts bound every socket operation.

pub mod client;
pub mod codec;
pub mod config;
pub mod server;

pub use client::TcpTransport;
pub use codec::{encode_frame, FrameDecoder, FRAME_HEADER_BYTES};
pub use config::TransportConfig;
pub use server::TcpFrameServer;
