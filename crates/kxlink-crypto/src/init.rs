//! Process-wide crypto backend initialization.
//!
//! [`init`] must succeed once before keys or nonces are generated. It probes
//! the OS CSPRNG and records the outcome; later calls return the recorded
//! result without probing again. Operations that need randomness call
//! [`ensure_initialized`] and fail fast with
//! [`CryptoError::NotInitialized`] if `init` was never called.

use std::sync::OnceLock;

use zeroize::Zeroize;

use crate::CryptoError;
use crate::random::fill_random;

static BACKEND_READY: OnceLock<bool> = OnceLock::new();

/// Initialize the crypto backend.
///
/// Safe to call from several places; only the first call does work.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if the OS CSPRNG is unusable.
pub fn init() -> Result<(), CryptoError> {
    let ready = *BACKEND_READY.get_or_init(|| probe_entropy().is_ok());
    if ready {
        Ok(())
    } else {
        Err(CryptoError::RandomFailed)
    }
}

/// Check that [`init`] ran and succeeded.
///
/// # Errors
///
/// Returns [`CryptoError::NotInitialized`] if `init` was never called, or
/// [`CryptoError::RandomFailed`] if it was called and failed.
pub fn ensure_initialized() -> Result<(), CryptoError> {
    match BACKEND_READY.get() {
        Some(true) => Ok(()),
        Some(false) => Err(CryptoError::RandomFailed),
        None => Err(CryptoError::NotInitialized),
    }
}

/// Whether [`init`] has completed successfully.
#[must_use]
pub fn is_initialized() -> bool {
    matches!(BACKEND_READY.get(), Some(true))
}

fn probe_entropy() -> Result<(), CryptoError> {
    let mut probe = [0u8; 32];
    fill_random(&mut probe)?;

    // An all-zero draw from a working CSPRNG has probability 2^-256
    let stuck = probe.iter().all(|&b| b == 0);
    probe.zeroize();

    if stuck {
        Err(CryptoError::RandomFailed)
    } else {
        Ok(())
    }
}
