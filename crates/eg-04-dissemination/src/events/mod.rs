//! Error types for the dissemination engine and its transport port.

use eg_03_messages::MessageError;
use shared_types::Address;
use thiserror::Error;

/// Why an inbound message was dropped or an outbound operation failed.
#[derive(Debug, Error)]
pub enum DisseminationError {
    /// Frame could not be decoded, or a required field was missing.
    #[error("Malformed message: {0}")]
    Malformed(#[source] MessageError),

    /// Direct message whose author is not in the peer directory.
    #[error("Unknown sender: {0}")]
    UnknownSender(Address),

    /// Relay hop from a router that is not in the peer directory.
    #[error("Unauthorized router: {0}")]
    UnauthorizedRouter(Address),

    /// Author signature does not recover to `_sender`.
    #[error("Invalid author signature (claimed sender {claimed})")]
    InvalidSignature { claimed: Address },

    /// Router signature does not recover to the claimed router.
    #[error("Invalid router signature (claimed router {router})")]
    InvalidRouterSignature { router: Address },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Local encode or signing failure while preparing an outbound message.
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DisseminationError {
    /// Authentication failures: never retried, logged as security events.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            DisseminationError::UnknownSender(_)
                | DisseminationError::UnauthorizedRouter(_)
                | DisseminationError::InvalidSignature { .. }
                | DisseminationError::InvalidRouterSignature { .. }
        )
    }
}

/// Errors reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("Timed out talking to {0}")]
    Timeout(String),

    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Transport closed")]
    Closed,
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}
