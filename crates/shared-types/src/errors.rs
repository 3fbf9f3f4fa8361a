//! # Error Types
//!
//! Errors raised while parsing shared identity types.

use thiserror::Error;

/// Errors that can occur when decoding an [`Address`](crate::Address).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Input was not valid hexadecimal.
    #[error("Invalid hex address: {0}")]
    InvalidHex(String),

    /// Decoded byte length was not 20.
    #[error("Invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}
