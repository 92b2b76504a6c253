//! # kxlink Core
//!
//! Client side of the kxlink protocol: an ephemeral X25519 key exchange
//! followed by one `ChaCha20-Poly1305` framed message.
//!
//! This crate provides:
//! - [`perform_client_handshake`]: key exchange and session key derivation
//! - [`decrypt_framed_message`]: read, validate and open one frame
//! - [`write_framed_message`]: the sending counterpart, for peers and tests
//! - [`ClientSession`]: the end-to-end flow and its failure policy
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ClientSession                           │
//! │   Connecting → Handshaking → Ready → Receiving → Closed     │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │          handshake           │            codec             │
//! │   (X25519 + crypto_kx KDF)   │  (u32 len | nonce | ct+tag)  │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │              kxlink-transport: write_all / read_exact       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `kxlink_crypto::init` must be called once per process before any of
//! these operations; they return [`Error::NotInitialized`] otherwise.
//!
//! Only one message is exchanged per connection. The wire format has no
//! sequence number, so carrying more than one message needs a nonce and
//! replay policy that this crate does not define.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod codec;
pub mod error;
pub mod handshake;
pub mod session;

pub use codec::{
    CodecConfig, DEFAULT_MAX_MESSAGE_SIZE, FRAME_HEADER_SIZE, MAX_MESSAGE_SIZE_LIMIT,
    MessageLength, SealedFrame, decrypt_framed_message, read_frame, write_framed_message,
};
pub use error::{Error, ErrorKind, FrameField, ProtocolError, Result};
pub use handshake::perform_client_handshake;
pub use session::{ClientSession, SessionConfig, SessionState};

/// Default server port
pub const DEFAULT_PORT: u16 = 12345;
