//! `ChaCha20-Poly1305` AEAD encryption (IETF variant).
//!
//! - 256-bit keys
//! - 96-bit nonces
//! - 128-bit authentication tags, appended to the ciphertext
//!
//! The wire protocol carries no associated data, so none of these methods
//! take any. A 96-bit nonce is too short to draw at random for long-lived
//! keys; senders that emit more than a handful of messages under one key
//! should use [`NonceSequence`].

use std::fmt;

use chacha20poly1305::{
    ChaCha20Poly1305,
    aead::{Aead, KeyInit},
};
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::random::random_12;
use crate::{CryptoError, NONCE_SIZE, SESSION_KEY_SIZE, TAG_SIZE, ensure_initialized};

/// `ChaCha20-Poly1305` nonce (12 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Create a nonce from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create a nonce from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidNonceLength`] unless the slice is
    /// exactly 12 bytes. Short or long input is never padded or truncated.
    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; NONCE_SIZE] =
            slice
                .try_into()
                .map_err(|_| CryptoError::InvalidNonceLength {
                    expected: NONCE_SIZE,
                    actual: slice.len(),
                })?;
        Ok(Self(bytes))
    }

    /// Draw a nonce from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NotInitialized`] before [`crate::init`], or
    /// [`CryptoError::RandomFailed`] if the CSPRNG fails.
    pub fn random() -> Result<Self, CryptoError> {
        ensure_initialized()?;
        Ok(Self(random_12()?))
    }

    /// Draw a nonce from the given CSPRNG.
    #[must_use]
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Counter nonce: 4 zero bytes followed by the big-endian counter.
    #[must_use]
    pub fn from_counter(counter: u64) -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        bytes[4..].copy_from_slice(&counter.to_be_bytes());
        Self(bytes)
    }

    /// Get raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }

    fn as_generic(&self) -> &chacha20poly1305::Nonce {
        chacha20poly1305::Nonce::from_slice(&self.0)
    }
}

/// Monotonic nonce source for one sending key.
///
/// Never yields the same nonce twice; once the 64-bit counter is spent it
/// returns [`CryptoError::NonceExhausted`] instead of wrapping.
#[derive(Debug, Default)]
pub struct NonceSequence {
    next: u64,
    exhausted: bool,
}

impl NonceSequence {
    /// Start a sequence at counter zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a sequence at an arbitrary counter.
    #[must_use]
    pub fn starting_at(counter: u64) -> Self {
        Self {
            next: counter,
            exhausted: false,
        }
    }

    /// Take the next nonce.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::NonceExhausted`] after `u64::MAX` has been used.
    pub fn next_nonce(&mut self) -> Result<Nonce, CryptoError> {
        if self.exhausted {
            return Err(CryptoError::NonceExhausted);
        }
        let nonce = Nonce::from_counter(self.next);
        match self.next.checked_add(1) {
            Some(next) => self.next = next,
            None => self.exhausted = true,
        }
        Ok(nonce)
    }

    /// Number of nonces handed out so far, relative to zero.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.next
    }
}

/// AEAD key (32 bytes), one traffic direction.
///
/// Not `Clone`: a session key has exactly one owner and is zeroized when
/// that owner drops it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AeadKey([u8; SESSION_KEY_SIZE]);

impl AeadKey {
    /// Create a key from raw bytes.
    #[must_use]
    pub fn new(bytes: [u8; SESSION_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if slice length is not 32 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        if slice.len() != SESSION_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: SESSION_KEY_SIZE,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; SESSION_KEY_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Generate a random key.
    #[must_use]
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SESSION_KEY_SIZE];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Get raw key bytes.
    ///
    /// # Security
    ///
    /// Handle with extreme care - this exposes the raw key material.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_SIZE] {
        &self.0
    }

    /// Encrypt plaintext.
    ///
    /// Returns ciphertext with appended authentication tag (`plaintext.len()` + 16 bytes).
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EncryptionFailed`] if AEAD encryption fails.
    pub fn encrypt(&self, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = ChaCha20Poly1305::new((&self.0).into());

        cipher
            .encrypt(nonce.as_generic(), plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)
    }

    /// Decrypt ciphertext.
    ///
    /// Input must include the authentication tag at the end. Nothing is
    /// returned unless the tag verifies.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] on authentication failure.
    pub fn decrypt(&self, nonce: &Nonce, ciphertext_and_tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext_and_tag.len() < TAG_SIZE {
            return Err(CryptoError::DecryptionFailed);
        }

        let cipher = ChaCha20Poly1305::new((&self.0).into());

        cipher
            .decrypt(nonce.as_generic(), ciphertext_and_tag)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl fmt::Debug for AeadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AeadKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn test_aead_known_answer() {
        let key_bytes: [u8; 32] = std::array::from_fn(|i| 0x80 + i as u8);
        let key = AeadKey::new(key_bytes);
        let nonce = Nonce::from_slice(&hex::decode("070000004041424344454647").unwrap()).unwrap();

        let ciphertext = key.encrypt(&nonce, b"hello").unwrap();
        assert_eq!(
            hex::encode(&ciphertext),
            "f71e85316eadbcb32f6c82bbf8a12e7f25bfc750a7"
        );
        assert_eq!(key.decrypt(&nonce, &ciphertext).unwrap(), b"hello");
    }

    #[test]
    fn test_aead_key_encrypt_decrypt() {
        let key = AeadKey::generate(&mut OsRng);
        let nonce = Nonce::generate(&mut OsRng);
        let plaintext = b"secret message";

        let ciphertext = key.encrypt(&nonce, plaintext).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);

        let decrypted = key.decrypt(&nonce, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_aead_tamper_detection() {
        let key = AeadKey::generate(&mut OsRng);
        let nonce = Nonce::generate(&mut OsRng);

        let mut ciphertext = key.encrypt(&nonce, b"Hello, kxlink!").unwrap();
        ciphertext[0] ^= 0xFF;

        assert_eq!(
            key.decrypt(&nonce, &ciphertext),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn test_aead_wrong_key_fails() {
        let key1 = AeadKey::generate(&mut OsRng);
        let key2 = AeadKey::generate(&mut OsRng);
        let nonce = Nonce::generate(&mut OsRng);

        let ciphertext = key1.encrypt(&nonce, b"secret").unwrap();
        assert!(key2.decrypt(&nonce, &ciphertext).is_err());
    }

    #[test]
    fn test_aead_wrong_nonce_fails() {
        let key = AeadKey::generate(&mut OsRng);
        let nonce1 = Nonce::from_counter(1);
        let nonce2 = Nonce::from_counter(2);

        let ciphertext = key.encrypt(&nonce1, b"secret").unwrap();
        assert!(key.decrypt(&nonce2, &ciphertext).is_err());
    }

    #[test]
    fn test_decrypt_shorter_than_tag() {
        let key = AeadKey::generate(&mut OsRng);
        let nonce = Nonce::generate(&mut OsRng);
        assert_eq!(
            key.decrypt(&nonce, &[0u8; TAG_SIZE - 1]),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn test_empty_plaintext() {
        let key = AeadKey::generate(&mut OsRng);
        let nonce = Nonce::generate(&mut OsRng);

        let ciphertext = key.encrypt(&nonce, b"").unwrap();
        assert_eq!(ciphertext.len(), TAG_SIZE);
        assert!(key.decrypt(&nonce, &ciphertext).unwrap().is_empty());
    }

    #[test]
    fn test_nonce_from_slice() {
        let bytes = [0x42u8; NONCE_SIZE];
        let nonce = Nonce::from_slice(&bytes).unwrap();
        assert_eq!(nonce.as_bytes(), &bytes);

        assert_eq!(
            Nonce::from_slice(&[0u8; 11]),
            Err(CryptoError::InvalidNonceLength {
                expected: 12,
                actual: 11
            })
        );
        assert!(Nonce::from_slice(&[0u8; 24]).is_err());
    }

    #[test]
    fn test_nonce_from_counter() {
        let nonce = Nonce::from_counter(0x0102_0304_0506_0708);
        assert_eq!(
            nonce.as_bytes(),
            &[0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn test_nonce_sequence_is_unique() {
        let mut seq = NonceSequence::new();
        let a = seq.next_nonce().unwrap();
        let b = seq.next_nonce().unwrap();
        let c = seq.next_nonce().unwrap();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(seq.position(), 3);
    }

    #[test]
    fn test_nonce_sequence_exhaustion() {
        let mut seq = NonceSequence::starting_at(u64::MAX);
        assert_eq!(seq.next_nonce().unwrap(), Nonce::from_counter(u64::MAX));
        assert_eq!(seq.next_nonce(), Err(CryptoError::NonceExhausted));
        assert_eq!(seq.next_nonce(), Err(CryptoError::NonceExhausted));
    }

    #[test]
    fn test_key_debug_redacted() {
        let key = AeadKey::new([0xAB; 32]);
        let rendered = format!("{key:?}");
        assert!(!rendered.to_lowercase().contains("ab, "));
        assert!(!rendered.contains("171"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_key_from_slice_length() {
        assert!(AeadKey::from_slice(&[0u8; 31]).is_err());
        assert!(AeadKey::from_slice(&[0u8; 32]).is_ok());
    }

    mod aead_properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn wrong_nonce_never_opens(
                key in any::<[u8; 32]>(),
                nonce in any::<[u8; 12]>(),
                other in any::<[u8; 12]>(),
                plaintext in prop::collection::vec(any::<u8>(), 0..256),
            ) {
                prop_assume!(nonce != other);
                let key = AeadKey::new(key);

                let ciphertext = key.encrypt(&Nonce::from_bytes(nonce), &plaintext).unwrap();
                prop_assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);
                prop_assert_eq!(
                    key.decrypt(&Nonce::from_bytes(other), &ciphertext),
                    Err(CryptoError::DecryptionFailed)
                );
            }

            #[test]
            fn nonce_from_slice_rejects_other_lengths(len in 0usize..64) {
                prop_assume!(len != NONCE_SIZE);
                let result = Nonce::from_slice(&vec![0u8; len]);
                prop_assert_eq!(
                    result,
                    Err(CryptoError::InvalidNonceLength { expected: NONCE_SIZE, actual: len })
                );
            }
        }
    }
}
