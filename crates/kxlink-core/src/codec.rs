//! Message framing and AEAD sealing.
//!
//! Wire format (big-endian):
//!
//! ```text
//! +----------------+-------------+--------------------------------+
//! | length: u32 BE | nonce: 12 B | ciphertext || tag: length B    |
//! +----------------+-------------+--------------------------------+
//! ```
//!
//! `length` comes from the peer and is validated into a [`MessageLength`]
//! before anything is allocated from it.

use std::io::{Read, Write};

use kxlink_crypto::aead::{AeadKey, Nonce, NonceSequence};
use kxlink_crypto::{NONCE_SIZE, TAG_SIZE, ensure_initialized};
use kxlink_transport::{StreamError, read_exact_into, write_all};

use crate::error::{Error, FrameField, ProtocolError, Result};

/// Length prefix size
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Bytes preceding the ciphertext
pub const FRAME_HEADER_SIZE: usize = LENGTH_PREFIX_SIZE + NONCE_SIZE;

/// Default bound on the declared ciphertext length (16 MiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;

/// Ceiling for any configured bound (256 MiB)
pub const MAX_MESSAGE_SIZE_LIMIT: u32 = 256 * 1024 * 1024;

const MIN_MESSAGE_SIZE: u32 = TAG_SIZE as u32;

/// Codec configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    max_message_size: u32,
}

impl CodecConfig {
    /// Configure the ciphertext bound, clamped to
    /// `[TAG_SIZE, MAX_MESSAGE_SIZE_LIMIT]`.
    #[must_use]
    pub fn new(max_message_size: u32) -> Self {
        Self {
            max_message_size: max_message_size.clamp(MIN_MESSAGE_SIZE, MAX_MESSAGE_SIZE_LIMIT),
        }
    }

    /// Largest accepted ciphertext length, tag included.
    #[must_use]
    pub fn max_message_size(&self) -> u32 {
        self.max_message_size
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_SIZE)
    }
}

/// Validated ciphertext length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLength(u32);

impl MessageLength {
    /// Validate a declared length.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MessageTooLarge`] above `max`,
    /// [`ProtocolError::MessageTooShort`] below the tag size.
    pub fn new(declared: u32, max: u32) -> std::result::Result<Self, ProtocolError> {
        if declared > max {
            return Err(ProtocolError::MessageTooLarge {
                declared: u64::from(declared),
                max,
            });
        }
        if declared < MIN_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooShort {
                declared,
                min: MIN_MESSAGE_SIZE,
            });
        }
        Ok(Self(declared))
    }

    /// Length of the ciphertext that would carry `plaintext_len` bytes.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MessageTooLarge`] if it would exceed `max`.
    pub fn for_plaintext(plaintext_len: usize, max: u32) -> std::result::Result<Self, ProtocolError> {
        let declared = plaintext_len as u64 + TAG_SIZE as u64;
        let declared = u32::try_from(declared)
            .map_err(|_| ProtocolError::MessageTooLarge { declared, max })?;
        Self::new(declared, max)
    }

    /// Ciphertext length in bytes, tag included.
    #[must_use]
    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// Plaintext length this ciphertext decrypts to.
    #[must_use]
    pub fn plaintext_len(self) -> usize {
        self.get() - TAG_SIZE
    }

    /// Wire encoding.
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; LENGTH_PREFIX_SIZE] {
        self.0.to_be_bytes()
    }
}

/// One encrypted frame, not yet opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedFrame {
    length: MessageLength,
    nonce: Nonce,
    ciphertext: Vec<u8>,
}

impl SealedFrame {
    /// Assemble a frame from raw parts.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidNonceLength`] unless `nonce` is exactly 12
    /// bytes, or a length error if `ciphertext` is out of bounds.
    pub fn from_parts(nonce: &[u8], ciphertext: Vec<u8>, config: &CodecConfig) -> Result<Self> {
        let nonce = Nonce::from_slice(nonce)?;
        let declared = u32::try_from(ciphertext.len()).map_err(|_| {
            ProtocolError::MessageTooLarge {
                declared: ciphertext.len() as u64,
                max: config.max_message_size(),
            }
        })?;
        let length = MessageLength::new(declared, config.max_message_size())?;
        Ok(Self {
            length,
            nonce,
            ciphertext,
        })
    }

    /// Encrypt `plaintext` under `key` with `nonce`.
    ///
    /// The caller guarantees `nonce` is never reused with `key`.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] before `kxlink_crypto::init`, a length error
    /// if the result would exceed the configured bound, or [`Error::Crypto`].
    pub fn seal(key: &AeadKey, nonce: Nonce, plaintext: &[u8], config: &CodecConfig) -> Result<Self> {
        ensure_initialized()?;
        let length = MessageLength::for_plaintext(plaintext.len(), config.max_message_size())?;
        let ciphertext = key.encrypt(&nonce, plaintext)?;
        debug_assert_eq!(ciphertext.len(), length.get());
        Ok(Self {
            length,
            nonce,
            ciphertext,
        })
    }

    /// Verify and decrypt.
    ///
    /// # Errors
    ///
    /// [`Error::Authentication`] if the tag does not verify; no plaintext is
    /// produced in that case.
    pub fn open(&self, key: &AeadKey) -> Result<Vec<u8>> {
        ensure_initialized()?;
        let plaintext = key.decrypt(&self.nonce, &self.ciphertext)?;
        Ok(plaintext)
    }

    /// Wire encoding: length, nonce, ciphertext.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.length.to_be_bytes());
        out.extend_from_slice(self.nonce.as_bytes());
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Validated ciphertext length.
    #[must_use]
    pub fn length(&self) -> MessageLength {
        self.length
    }

    /// Frame nonce.
    #[must_use]
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Ciphertext with trailing tag.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

/// Read one frame without decrypting it.
///
/// The length prefix is validated before the nonce or body is read. A close
/// while reading the prefix is a connection error; a close after an accepted
/// prefix is a truncated frame.
///
/// # Errors
///
/// [`Error::Connection`] or [`Error::Protocol`].
pub fn read_frame<R: Read + ?Sized>(channel: &mut R, config: &CodecConfig) -> Result<SealedFrame> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    read_exact_into(channel, &mut prefix)?;

    let length = MessageLength::new(u32::from_be_bytes(prefix), config.max_message_size())?;
    tracing::debug!("Frame header: {} byte ciphertext", length.get());

    let mut nonce = [0u8; NONCE_SIZE];
    read_field(channel, &mut nonce, FrameField::Nonce)?;

    let mut ciphertext = vec![0u8; length.get()];
    read_field(channel, &mut ciphertext, FrameField::Ciphertext)?;

    Ok(SealedFrame {
        length,
        nonce: Nonce::from_bytes(nonce),
        ciphertext,
    })
}

fn read_field<R: Read + ?Sized>(channel: &mut R, buf: &mut [u8], field: FrameField) -> Result<()> {
    read_exact_into(channel, buf).map_err(|err| match err {
        StreamError::Closed { expected, received } => Error::Protocol(ProtocolError::Truncated {
            field,
            expected,
            received,
        }),
        other => Error::Connection(other),
    })
}

/// Read and decrypt one framed message with the receive key.
///
/// # Errors
///
/// [`Error::NotInitialized`], [`Error::Connection`], [`Error::Protocol`], or
/// [`Error::Authentication`].
pub fn decrypt_framed_message<R: Read + ?Sized>(
    channel: &mut R,
    rx_key: &AeadKey,
    config: &CodecConfig,
) -> Result<Vec<u8>> {
    ensure_initialized()?;
    let frame = read_frame(channel, config)?;
    frame.open(rx_key)
}

/// Encrypt `plaintext` with the next nonce from `nonces` and send it.
///
/// # Errors
///
/// [`Error::NotInitialized`], a length error, [`Error::Crypto`] if the nonce
/// sequence is exhausted, or [`Error::Connection`].
pub fn write_framed_message<W: Write + ?Sized>(
    channel: &mut W,
    tx_key: &AeadKey,
    nonces: &mut NonceSequence,
    plaintext: &[u8],
    config: &CodecConfig,
) -> Result<()> {
    ensure_initialized()?;
    let frame = SealedFrame::seal(tx_key, nonces.next_nonce()?, plaintext, config)?;
    write_all(channel, &frame.encode())?;
    Ok(())
}
