//! # kxlink Crypto
//!
//! Cryptographic primitives for the kxlink protocol.
//!
//! This crate provides:
//! - One-time process-wide initialization of the crypto backend
//! - Ephemeral X25519 keypairs
//! - Session key derivation compatible with libsodium's `crypto_kx`
//! - `ChaCha20-Poly1305` (IETF, 96-bit nonce) AEAD
//! - Secure random number generation
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm | Security Level |
//! |----------|-----------|----------------|
//! | Key Exchange | X25519 | 128-bit |
//! | Session KDF | BLAKE2b-512 | 256-bit |
//! | AEAD | ChaCha20-Poly1305 (IETF) | 256-bit key |
//!
//! ## Trust Boundary
//!
//! The key exchange is unauthenticated: neither side proves a long-term
//! identity, so an active attacker able to substitute public keys in flight
//! can sit in the middle. The protocol protects against passive observers
//! only. Anything stronger needs a signature or certificate layer on top.
//!
//! All key material is held in owned, non-`Clone` buffers that are zeroized
//! on drop.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod aead;
pub mod error;
pub mod init;
pub mod kx;
pub mod random;
pub mod x25519;

pub use error::CryptoError;
pub use init::{ensure_initialized, init, is_initialized};
pub use kx::{Role, SessionKeys, derive_session_keys};

/// X25519 public key size
pub const PUBLIC_KEY_SIZE: usize = 32;

/// X25519 secret key size
pub const SECRET_KEY_SIZE: usize = 32;

/// Session key size (one direction)
pub const SESSION_KEY_SIZE: usize = 32;

/// `ChaCha20-Poly1305` IETF nonce size (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size
pub const TAG_SIZE: usize = 16;
