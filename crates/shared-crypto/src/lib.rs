//! # Shared Crypto - Node Identity Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Message identity, grid coordinates, addresses |
//! | `ecdsa` | secp256k1 | Author and router signatures |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic, low-S normalization (EIP-2)
//! - **Recovery**: signer identity is recovered from the signature itself, so
//!   a message carries no public key, only the 65-byte `r || s || v` form

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{address_from_verifying_key, NodeKey, RecoverableSignature, SIGNATURE_BYTES};
pub use errors::CryptoError;
pub use hashing::keccak256;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
