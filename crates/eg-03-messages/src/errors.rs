//! Message error types.

use eg_01_elastic_grid::GridError;
use shared_crypto::CryptoError;
use shared_types::AddressError;
use thiserror::Error;

/// Errors raised while building, encoding or decoding a message.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Address error: {0}")]
    Address(#[from] AddressError),
}

impl From<bincode::Error> for MessageError {
    fn from(err: bincode::Error) -> Self {
        MessageError::Codec(err.to_string())
    }
}
