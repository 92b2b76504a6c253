//! X25519 ephemeral keypairs (RFC 7748).
//!
//! An [`EphemeralKeypair`] lives for exactly one handshake. It cannot be
//! cloned or serialized, and the only way to use its secret half is
//! [`crate::derive_session_keys`], which consumes the keypair. The secret
//! scalar is zeroized when the keypair is dropped.

use std::fmt;

use rand_core::{CryptoRng, OsRng, RngCore};

use crate::{CryptoError, PUBLIC_KEY_SIZE, ensure_initialized};

/// X25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(x25519_dalek::PublicKey);

impl PublicKey {
    /// Import public key from bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(x25519_dalek::PublicKey::from(bytes))
    }

    /// Import public key from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] unless the slice is 32 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; PUBLIC_KEY_SIZE] =
            slice
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: PUBLIC_KEY_SIZE,
                    actual: slice.len(),
                })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Export public key as bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        *self.0.as_bytes()
    }

    /// Get bytes as a slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.0.as_bytes()
    }

    pub(crate) fn inner(&self) -> &x25519_dalek::PublicKey {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(")?;
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Single-use X25519 keypair.
pub struct EphemeralKeypair {
    secret: x25519_dalek::StaticSecret,
    public: PublicKey,
}

impl EphemeralKeypair {
    /// Generate a fresh keypair from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NotInitialized`] if [`crate::init`] has not run.
    pub fn generate() -> Result<Self, CryptoError> {
        ensure_initialized()?;
        Ok(Self::from_rng(&mut OsRng))
    }

    /// Generate a keypair from the given CSPRNG.
    ///
    /// The scalar is clamped per RFC 7748 at use.
    pub fn from_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let secret = x25519_dalek::StaticSecret::random_from_rng(rng);
        let public = PublicKey(x25519_dalek::PublicKey::from(&secret));
        Self { secret, public }
    }

    #[cfg(test)]
    pub(crate) fn from_secret_bytes(bytes: [u8; crate::SECRET_KEY_SIZE]) -> Self {
        let secret = x25519_dalek::StaticSecret::from(bytes);
        let public = PublicKey(x25519_dalek::PublicKey::from(&secret));
        Self { secret, public }
    }

    /// The public half, safe to transmit.
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Diffie-Hellman with the peer key, consuming the keypair.
    ///
    /// Returns `None` if the result is non-contributory (the peer sent a
    /// low-order point).
    pub(crate) fn exchange(self, peer: &PublicKey) -> Option<(PublicKey, SharedSecret)> {
        let shared = self.secret.diffie_hellman(peer.inner());
        if !shared.was_contributory() {
            return None;
        }
        Some((self.public, SharedSecret(shared)))
    }
}

impl fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// X25519 shared point, zeroized on drop.
pub(crate) struct SharedSecret(x25519_dalek::SharedSecret);

impl SharedSecret {
    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}
