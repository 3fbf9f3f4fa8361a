//! Peer directory error types.

use thiserror::Error;

/// Errors raised while parsing peer endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerDirectoryError {
    #[error("Invalid enode: {0}")]
    InvalidEnode(String),

    #[error("Invalid peer address in enode: {0}")]
    InvalidAddress(String),

    #[error("Invalid port in enode: {0}")]
    InvalidPort(String),
}
