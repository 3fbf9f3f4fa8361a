//! Grid error types.

use thiserror::Error;

/// Errors raised while constructing grid values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// A layout axis was zero; layouts are never wildcarded.
    #[error("Layout axis {axis} is zero")]
    ZeroAxis { axis: char },

    /// Wire form of a coordinate must be exactly three bytes.
    #[error("Invalid coordinate length: expected 3 bytes, got {0}")]
    InvalidLength(usize),
}
