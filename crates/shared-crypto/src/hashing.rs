//! # Keccak-256 Hashing
//!
//! The digest used for message identity, coordinate derivation and address
//! derivation.

use sha3::{Digest, Keccak256};
use shared_types::Hash;

/// Keccak-256 hash (one-shot).
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}
