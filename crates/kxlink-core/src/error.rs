//! Error types for the kxlink core protocol.

use std::fmt;

use kxlink_crypto::CryptoError;
use kxlink_transport::StreamError;
use thiserror::Error;

use crate::session::SessionState;

/// Core protocol errors
///
/// Every variant is fatal for the session it occurred on. Messages never
/// include key material.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure: connect, I/O error, or peer closed the stream
    #[error("connection error: {0}")]
    Connection(#[from] StreamError),

    /// Key exchange produced an unusable result
    #[error("handshake error: {0}")]
    Handshake(#[source] CryptoError),

    /// Malformed frame
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// AEAD tag did not verify (corruption or tampering, indistinguishably)
    #[error("authentication failed: message rejected")]
    Authentication,

    /// Crypto backend used before `kxlink_crypto::init`
    #[error("crypto backend not initialized")]
    NotInitialized,

    /// Other cryptographic failure
    #[error("crypto error: {0}")]
    Crypto(#[source] CryptoError),

    /// Operation not allowed in the current session state
    #[error("cannot {operation} in state {state:?}")]
    InvalidState {
        /// State at the time of the call
        state: SessionState,
        /// Attempted operation
        operation: &'static str,
    },
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::NotInitialized => Self::NotInitialized,
            CryptoError::DecryptionFailed => Self::Authentication,
            CryptoError::WeakPublicKey => Self::Handshake(err),
            CryptoError::InvalidNonceLength { expected, actual } => {
                Self::Protocol(ProtocolError::InvalidNonceLength { expected, actual })
            }
            other => Self::Crypto(other),
        }
    }
}

/// Error category, for diagnostics and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// [`Error::Connection`]
    Connection,
    /// [`Error::Handshake`]
    Handshake,
    /// [`Error::Protocol`]
    Protocol,
    /// [`Error::Authentication`]
    Authentication,
    /// [`Error::NotInitialized`]
    NotInitialized,
    /// [`Error::Crypto`]
    Crypto,
    /// [`Error::InvalidState`]
    InvalidState,
}

impl Error {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::Handshake(_) => ErrorKind::Handshake,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Authentication => ErrorKind::Authentication,
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connection => "ConnectionError",
            Self::Handshake => "HandshakeError",
            Self::Protocol => "ProtocolError",
            Self::Authentication => "AuthenticationError",
            Self::NotInitialized => "NotInitialized",
            Self::Crypto => "CryptoError",
            Self::InvalidState => "InvalidState",
        };
        f.write_str(name)
    }
}

/// Frame-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Declared ciphertext length exceeds the configured maximum
    #[error("declared message length {declared} exceeds maximum {max}")]
    MessageTooLarge {
        /// Length from the wire
        declared: u64,
        /// Configured maximum
        max: u32,
    },

    /// Declared ciphertext length cannot even hold the tag
    #[error("declared message length {declared} below minimum {min}")]
    MessageTooShort {
        /// Length from the wire
        declared: u32,
        /// Tag size
        min: u32,
    },

    /// Nonce is not exactly the cipher's nonce size
    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Cipher nonce size
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Peer closed mid-frame
    #[error("frame truncated in {field}: {received} of {expected} bytes")]
    Truncated {
        /// Field being read
        field: FrameField,
        /// Bytes the field needs
        expected: usize,
        /// Bytes received before the close
        received: usize,
    },
}

/// Frame fields, for truncation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameField {
    /// 12-byte nonce
    Nonce,
    /// Ciphertext and tag
    Ciphertext,
}

impl fmt::Display for FrameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nonce => f.write_str("nonce"),
            Self::Ciphertext => f.write_str("ciphertext"),
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
