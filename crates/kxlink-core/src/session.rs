//! Client session state machine.
//!
//! ```text
//! Connecting -> Handshaking -> Ready -> Receiving -> Closed
//!      \             \            \          \
//!       +-------------+------------+----------+--> Failed
//! ```
//!
//! `Closed` and `Failed` are terminal. Entering either one drops the channel
//! (closing the socket) and the session keys (zeroizing them). Nothing is
//! retried: the first error moves the session to `Failed` and is returned
//! to the caller.

use std::net::{SocketAddr, TcpStream};

use kxlink_crypto::SessionKeys;
use kxlink_transport::{Channel, CountingChannel, StreamStats, TransportConfig, tcp};

use crate::codec::{CodecConfig, decrypt_framed_message};
use crate::error::{Error, Result};
use crate::handshake::perform_client_handshake;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport being opened
    Connecting,
    /// Key exchange in progress
    Handshaking,
    /// Session keys derived, no message read yet
    Ready,
    /// Reading and decrypting the message
    Receiving,
    /// Message consumed, resources released
    Closed,
    /// An error ended the session, resources released
    Failed,
}

impl SessionState {
    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

/// Session configuration
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Socket options used by [`ClientSession::connect`]
    pub transport: TransportConfig,
    /// Frame limits
    pub codec: CodecConfig,
}

/// Client end of one connection.
pub struct ClientSession<C: Channel> {
    state: SessionState,
    channel: Option<CountingChannel<C>>,
    keys: Option<SessionKeys>,
    codec: CodecConfig,
    stats: StreamStats,
}

impl ClientSession<TcpStream> {
    /// Connect to `addr` and start a session on the new stream.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] before `kxlink_crypto::init`, or
    /// [`Error::Connection`] if the connect fails.
    pub fn connect(addr: SocketAddr, config: &SessionConfig) -> Result<Self> {
        kxlink_crypto::ensure_initialized()?;
        tracing::debug!("Session state: Connecting to {}", addr);

        let stream = tcp::connect(addr, &config.transport).inspect_err(|e| {
            tracing::warn!("Session failed in Connecting: {}", e);
        })?;

        Ok(Self::open(stream, config))
    }
}

impl<C: Channel> ClientSession<C> {
    /// Start a session on an already open channel.
    pub fn open(channel: C, config: &SessionConfig) -> Self {
        let mut session = Self {
            state: SessionState::Connecting,
            channel: Some(CountingChannel::new(channel)),
            keys: None,
            codec: config.codec,
            stats: StreamStats::new(),
        };
        session.enter(SessionState::Handshaking);
        session
    }

    /// Run the whole client flow on `channel` and return the plaintext.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::handshake`] or [`Self::receive_message`].
    pub fn run(channel: C, config: &SessionConfig) -> Result<Vec<u8>> {
        let mut session = Self::open(channel, config);
        session.handshake()?;
        session.receive_message()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether session keys are currently held.
    #[must_use]
    pub fn has_session_keys(&self) -> bool {
        self.keys.is_some()
    }

    /// Traffic counters; final once the session is terminal.
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.channel
            .as_ref()
            .map_or(self.stats, CountingChannel::stats)
    }

    /// Check if a state transition is valid
    #[must_use]
    pub fn can_transition(&self, to: SessionState) -> bool {
        use SessionState::{Closed, Connecting, Failed, Handshaking, Ready, Receiving};

        match (self.state, to) {
            (Connecting, Handshaking | Closed | Failed) => true,
            (Handshaking, Ready | Closed | Failed) => true,
            (Ready, Receiving | Closed | Failed) => true,
            (Receiving, Closed | Failed) => true,
            _ => false,
        }
    }

    /// Perform the key exchange.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless the session is `Handshaking`; otherwise
    /// any handshake error, after which the session is `Failed`.
    pub fn handshake(&mut self) -> Result<()> {
        self.require(SessionState::Handshaking, "handshake")?;

        let Some(channel) = self.channel.as_mut() else {
            return Err(self.fail(self.invalid_state("handshake")));
        };

        match perform_client_handshake(channel) {
            Ok(keys) => {
                self.keys = Some(keys);
                self.enter(SessionState::Ready);
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Read and decrypt the single message, then close.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless the session is `Ready`; otherwise any
    /// codec error, after which the session is `Failed`.
    pub fn receive_message(&mut self) -> Result<Vec<u8>> {
        self.require(SessionState::Ready, "receive a message")?;
        self.enter(SessionState::Receiving);

        let (Some(channel), Some(keys)) = (self.channel.as_mut(), self.keys.as_ref()) else {
            return Err(self.fail(self.invalid_state("receive a message")));
        };

        match decrypt_framed_message(channel, &keys.rx, &self.codec) {
            Ok(plaintext) => {
                tracing::debug!("Decrypted {} byte message", plaintext.len());
                self.close();
                Ok(plaintext)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Release the channel and keys and move to `Closed`.
    ///
    /// No-op on a terminal session.
    pub fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.release();
        self.enter(SessionState::Closed);
    }

    fn require(&self, expected: SessionState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            state: self.state,
            operation,
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        tracing::warn!("Session failed in {:?}: {} ({})", self.state, err, err.kind());
        self.release();
        self.enter(SessionState::Failed);
        err
    }

    fn release(&mut self) {
        self.keys = None;
        if let Some(channel) = self.channel.take() {
            self.stats = channel.stats();
            tracing::debug!(
                "Channel released: {} bytes sent, {} bytes received",
                self.stats.bytes_sent,
                self.stats.bytes_received
            );
        }
    }

    fn enter(&mut self, new_state: SessionState) {
        debug_assert!(
            self.can_transition(new_state),
            "invalid transition {:?} -> {:?}",
            self.state,
            new_state
        );
        let old_state = self.state;
        self.state = new_state;

        tracing::debug!(
            "Session state transition: {:?} -> {:?}",
            old_state,
            new_state
        );
    }
}
