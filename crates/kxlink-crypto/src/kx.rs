//! Session key derivation.
//!
//! Byte-compatible with libsodium's `crypto_kx`:
//!
//! ```text
//! q       = X25519(local_secret, peer_public)
//! k0 || k1 = BLAKE2b-512(q || client_public || server_public)
//!
//! client: rx = k0, tx = k1
//! server: tx = k0, rx = k1
//! ```
//!
//! so a client's `rx` is the server's `tx` and vice versa.
//!
//! The local secret is consumed, `q` is zeroized when dropped, and the
//! digest and key halves are wiped once copied into the session keys. The
//! hasher keeps its input block in memory after finalizing, so that block is
//! overwritten with zeros before the hasher is dropped.

use blake2::{Blake2b512, Digest};
use zeroize::Zeroize;

use crate::aead::AeadKey;
use crate::x25519::{EphemeralKeypair, PublicKey};
use crate::{CryptoError, SESSION_KEY_SIZE};

/// BLAKE2b input block size
const BLAKE2B_BLOCK_SIZE: usize = 128;

/// Which side of the exchange the local party plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Connection initiator
    Client,
    /// Connection acceptor
    Server,
}

/// Session keys derived from one handshake.
///
/// Both keys zeroize on drop.
#[derive(Debug)]
pub struct SessionKeys {
    /// Decrypts traffic the peer sent
    pub rx: AeadKey,
    /// Encrypts traffic this side sends
    pub tx: AeadKey,
}

/// Derive the session key pair, consuming the local keypair.
///
/// # Errors
///
/// Returns [`CryptoError::WeakPublicKey`] if `peer` is a low-order point and
/// the shared secret would be predictable.
pub fn derive_session_keys(
    local: EphemeralKeypair,
    role: Role,
    peer: &PublicKey,
) -> Result<SessionKeys, CryptoError> {
    let (local_public, shared) = local.exchange(peer).ok_or(CryptoError::WeakPublicKey)?;

    let (client_public, server_public) = match role {
        Role::Client => (local_public, *peer),
        Role::Server => (*peer, local_public),
    };

    let mut hasher = Blake2b512::new();
    hasher.update(shared.as_bytes());
    hasher.update(client_public.as_bytes());
    hasher.update(server_public.as_bytes());
    let mut digest = hasher.finalize_reset();
    scrub_hasher(&mut hasher);

    let mut first = [0u8; SESSION_KEY_SIZE];
    let mut second = [0u8; SESSION_KEY_SIZE];
    first.copy_from_slice(&digest[..SESSION_KEY_SIZE]);
    second.copy_from_slice(&digest[SESSION_KEY_SIZE..]);
    digest.as_mut_slice().zeroize();

    let keys = match role {
        Role::Client => SessionKeys {
            rx: AeadKey::new(first),
            tx: AeadKey::new(second),
        },
        Role::Server => SessionKeys {
            rx: AeadKey::new(second),
            tx: AeadKey::new(first),
        },
    };
    first.zeroize();
    second.zeroize();

    Ok(keys)
}

/// Overwrite the hasher's buffered block, which still holds `q` after
/// `finalize_reset`. The buffer is lazy, so a full block is stored rather
/// than compressed.
fn scrub_hasher(hasher: &mut Blake2b512) {
    hasher.update([0u8; BLAKE2B_BLOCK_SIZE]);
}
