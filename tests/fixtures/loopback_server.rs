//! Single-connection loopback server fixture
//!
//! Plays the server half of the protocol on `127.0.0.1` from a background
//! thread, following a [`ServerScript`]. Each fixture accepts exactly one
//! connection.
//!
//! # Example
//!
//! ```no_run
//! use kxlink_core::{ClientSession, SessionConfig};
//! use kxlink_integration_tests::fixtures::{LoopbackServer, ServerScript};
//!
//! let server = LoopbackServer::spawn(ServerScript::Message(b"hello".to_vec())).unwrap();
//! let mut session = ClientSession::connect(server.addr(), &SessionConfig::default()).unwrap();
//! session.handshake().unwrap();
//! assert_eq!(session.receive_message().unwrap(), b"hello");
//! ```

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use kxlink_core::{CodecConfig, SealedFrame, write_framed_message};
use kxlink_crypto::aead::{Nonce, NonceSequence};
use kxlink_crypto::x25519::{EphemeralKeypair, PublicKey};
use kxlink_crypto::{PUBLIC_KEY_SIZE, Role, SessionKeys, derive_session_keys};
use kxlink_transport::{read_exact_into, write_all};
use rand_core::OsRng;

/// How long the server waits on a silent client before giving up
const SERVER_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// What the server does after accepting the client
pub enum ServerScript {
    /// Complete the handshake and send one sealed message
    Message(Vec<u8>),
    /// Complete the handshake, seal the message, then rewrite the encoded
    /// frame before sending it
    Mangled {
        /// Message to seal
        plaintext: Vec<u8>,
        /// Applied to the encoded frame bytes
        mangle: fn(&mut Vec<u8>),
    },
    /// Complete the handshake and send these bytes in place of a frame
    Raw(Vec<u8>),
    /// Send these bytes as the server public key, then hang up
    ServerKey([u8; PUBLIC_KEY_SIZE]),
    /// Read the client public key and hang up without answering
    HangUp,
}

/// What the server observed
#[derive(Debug)]
pub struct ServerReport {
    /// Public key received from the client
    pub client_public: PublicKey,
    /// Bytes written after the server public key
    pub frame_bytes_sent: usize,
}

/// Background server bound to an ephemeral loopback port
pub struct LoopbackServer {
    addr: SocketAddr,
    handle: JoinHandle<io::Result<ServerReport>>,
}

impl LoopbackServer {
    /// Bind and start serving one connection.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails or the crypto backend cannot start.
    pub fn spawn(script: ServerScript) -> io::Result<Self> {
        kxlink_crypto::init().map_err(io::Error::other)?;

        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let handle = thread::spawn(move || {
            let (stream, peer) = listener.accept()?;
            tracing::debug!("Fixture accepted {}", peer);
            serve(stream, script)
        });

        Ok(Self { addr, handle })
    }

    /// Address clients should connect to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server thread and return its report.
    ///
    /// # Panics
    ///
    /// Panics if the server thread panicked or hit an I/O error.
    pub fn join(self) -> ServerReport {
        self.handle
            .join()
            .expect("server thread panicked")
            .expect("server I/O failed")
    }
}

fn serve(mut stream: TcpStream, script: ServerScript) -> io::Result<ServerReport> {
    stream.set_read_timeout(Some(SERVER_IO_TIMEOUT))?;
    stream.set_write_timeout(Some(SERVER_IO_TIMEOUT))?;

    let mut client_public = [0u8; PUBLIC_KEY_SIZE];
    read_exact_into(&mut stream, &mut client_public).map_err(io::Error::other)?;
    let client_public = PublicKey::from_bytes(client_public);

    let config = CodecConfig::default();
    let frame = match script {
        ServerScript::HangUp => Vec::new(),
        ServerScript::ServerKey(bytes) => {
            write_all(&mut stream, &bytes).map_err(io::Error::other)?;
            Vec::new()
        }
        ServerScript::Raw(bytes) => {
            answer_handshake(&mut stream, &client_public)?;
            bytes
        }
        ServerScript::Message(plaintext) => {
            let keys = answer_handshake(&mut stream, &client_public)?;
            let mut wire = Vec::new();
            write_framed_message(
                &mut wire,
                &keys.tx,
                &mut NonceSequence::new(),
                &plaintext,
                &config,
            )
            .map_err(io::Error::other)?;
            wire
        }
        ServerScript::Mangled { plaintext, mangle } => {
            let keys = answer_handshake(&mut stream, &client_public)?;
            let nonce = Nonce::random().map_err(io::Error::other)?;
            let mut wire = SealedFrame::seal(&keys.tx, nonce, &plaintext, &config)
                .map_err(io::Error::other)?
                .encode();
            mangle(&mut wire);
            wire
        }
    };

    write_all(&mut stream, &frame).map_err(io::Error::other)?;
    Ok(ServerReport {
        client_public,
        frame_bytes_sent: frame.len(),
    })
}

/// Send a fresh server public key and derive the server's session keys
fn answer_handshake(stream: &mut TcpStream, client_public: &PublicKey) -> io::Result<SessionKeys> {
    let keypair = EphemeralKeypair::from_rng(&mut OsRng);
    write_all(stream, keypair.public_key().as_bytes()).map_err(io::Error::other)?;
    derive_session_keys(keypair, Role::Server, client_public).map_err(io::Error::other)
}
