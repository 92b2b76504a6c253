//! Client side of the ephemeral key exchange.
//!
//! ```text
//! Client                              Server
//!   |                                    |
//!   |------- client public key (32) ---->|
//!   |<------ server public key (32) -----|
//!   |                                    |
//!   |  [both derive rx/tx session keys]  |
//! ```
//!
//! The exchange carries no identity proof. It keeps passive observers out,
//! but an active attacker who replaces the server's key is not detected.

use std::io::{Read, Write};

use kxlink_crypto::x25519::{EphemeralKeypair, PublicKey};
use kxlink_crypto::{PUBLIC_KEY_SIZE, Role, SessionKeys, derive_session_keys, ensure_initialized};
use kxlink_transport::{read_exact_into, write_all};

use crate::error::{Error, Result};

/// Run the client handshake and return the session keys.
///
/// A fresh keypair is generated for every call and consumed by the
/// derivation, so its secret half is gone by the time this returns.
///
/// # Errors
///
/// [`Error::NotInitialized`] before `kxlink_crypto::init`,
/// [`Error::Connection`] on transport failure, or [`Error::Handshake`] if
/// the server's key is rejected.
pub fn perform_client_handshake<C: Read + Write + ?Sized>(channel: &mut C) -> Result<SessionKeys> {
    ensure_initialized()?;

    let keypair = EphemeralKeypair::generate()?;
    write_all(channel, keypair.public_key().as_bytes())?;
    tracing::debug!("Sent client public key");

    let mut peer = [0u8; PUBLIC_KEY_SIZE];
    read_exact_into(channel, &mut peer)?;
    let peer = PublicKey::from_bytes(peer);
    tracing::debug!("Received server public key");

    derive_session_keys(keypair, Role::Client, &peer).map_err(Error::Handshake)
}
