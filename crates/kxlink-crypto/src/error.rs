//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic errors
///
/// None of the variants carry key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// A primitive was used before [`crate::init`] succeeded
    #[error("crypto backend not initialized")]
    NotInitialized,

    /// Random number generation failed
    #[error("random number generation failed")]
    RandomFailed,

    /// Invalid key length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid nonce length
    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Peer public key produced a non-contributory shared secret
    #[error("peer public key rejected: low-order point")]
    WeakPublicKey,

    /// AEAD encryption failed
    #[error("encryption failed")]
    EncryptionFailed,

    /// AEAD decryption failed (authentication failure)
    #[error("decryption failed: authentication failure")]
    DecryptionFailed,

    /// Nonce counter exhausted
    #[error("nonce counter exhausted, rekey required")]
    NonceExhausted,
}
