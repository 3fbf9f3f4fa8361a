//! # ECDSA Signatures (secp256k1)
//!
//! Recoverable secp256k1 signatures over 32-byte prehashed digests.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization on signing, high-S rejection on recovery (EIP-2)
//! - Secret key bytes are zeroized after parsing
//!
//! ## Use Cases
//!
//! - Author signature over a message body hash
//! - Relay (router) attestation over the same body hash

use crate::hashing::keccak256;
use crate::CryptoError;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use shared_types::{Address, Hash};
use std::fmt;
use zeroize::Zeroizing;

/// Length of a recoverable signature: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_BYTES: usize = 65;

/// Recoverable ECDSA signature (65 bytes, `r || s || v`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; SIGNATURE_BYTES]);

impl RecoverableSignature {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    /// Create from a slice that must be exactly 65 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; SIGNATURE_BYTES] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureLength {
                    expected: SIGNATURE_BYTES,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_BYTES] {
        &self.0
    }

    /// Copy into an owned vector (wire form).
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Recover the signer's address from this signature over `message_hash`.
    pub fn recover(&self, message_hash: &Hash) -> Result<Address, CryptoError> {
        let recovery_id = parse_recovery_id(self.0[64])?;
        let sig = Signature::from_slice(&self.0[..64])
            .map_err(|_| CryptoError::InvalidSignatureFormat)?;

        if sig.normalize_s().is_some() {
            return Err(CryptoError::MalleableSignature);
        }

        let key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
            .map_err(|_| CryptoError::RecoveryFailed)?;

        Ok(address_from_verifying_key(&key))
    }

    /// True when this signature recovers to `expected` over `message_hash`.
    pub fn verify(&self, message_hash: &Hash, expected: &Address) -> bool {
        matches!(self.recover(message_hash), Ok(recovered) if recovered == *expected)
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", hex::encode(self.0))
    }
}

/// secp256k1 node key.
///
/// Used both as a message author key and as a relay (router) key.
#[derive(Clone)]
pub struct NodeKey {
    signing_key: SigningKey,
    address: Address,
}

impl NodeKey {
    /// Generate random key.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Create from a hex-encoded secret, with or without `0x`.
    pub fn from_hex(secret: &str) -> Result<Self, CryptoError> {
        let digits = secret.trim().trim_start_matches("0x");
        let bytes =
            Zeroizing::new(hex::decode(digits).map_err(|_| CryptoError::InvalidPrivateKey)?);
        Self::from_bytes(&bytes)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = address_from_verifying_key(signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }

    /// Account address of this key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Hex-encoded secret (for key export). The buffer is zeroized on drop.
    pub fn to_hex(&self) -> Zeroizing<String> {
        let bytes: Zeroizing<[u8; 32]> = Zeroizing::new(self.signing_key.to_bytes().into());
        Zeroizing::new(hex::encode(bytes.as_slice()))
    }

    /// Sign a 32-byte digest, producing a low-S recoverable signature.
    pub fn sign(&self, message_hash: &Hash) -> Result<RecoverableSignature, CryptoError> {
        let (sig, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(message_hash)
            .map_err(|_| CryptoError::SigningFailed)?;

        // Normalize S to low value (EIP-2), flipping y-parity if it moved
        let (sig, recovery_id) = match sig.normalize_s() {
            Some(normalized) => (
                normalized,
                RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
            ),
            None => (sig, recovery_id),
        };

        let mut bytes = [0u8; SIGNATURE_BYTES];
        bytes[..64].copy_from_slice(&sig.to_bytes());
        bytes[64] = recovery_id.to_byte();
        Ok(RecoverableSignature(bytes))
    }
}

impl fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Derive the account address from a public key.
///
/// Last 20 bytes of keccak-256 over the uncompressed point without `0x04`.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::new(bytes)
}

/// Valid v values: 0, 1, 27, 28
fn parse_recovery_id(v: u8) -> Result<RecoveryId, CryptoError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(CryptoError::InvalidRecoveryId(v)),
    };

    RecoveryId::from_byte(id).ok_or(CryptoError::InvalidRecoveryId(v))
}
