//! Blocking TCP connect.
//!
//! Uses `socket2` so the connect itself can carry a deadline, then hands back
//! a plain [`TcpStream`] with the configured read/write deadlines applied.

use std::net::{SocketAddr, TcpStream};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::TransportConfig;
use crate::error::{StreamError, StreamResult};

/// Open a TCP connection to `addr`.
///
/// # Errors
///
/// Returns [`StreamError::Connect`] if the socket cannot be created or the
/// connect fails or times out, and [`StreamError::Io`] if socket options
/// cannot be applied.
pub fn connect(addr: SocketAddr, config: &TransportConfig) -> StreamResult<TcpStream> {
    let connect_err = |source| StreamError::Connect {
        addr: addr.to_string(),
        source,
    };

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(connect_err)?;

    let target = SockAddr::from(addr);
    match config.connect_timeout {
        Some(timeout) => socket.connect_timeout(&target, timeout),
        None => socket.connect(&target),
    }
    .map_err(connect_err)?;

    let stream: TcpStream = socket.into();
    stream.set_nodelay(config.nodelay)?;
    stream.set_read_timeout(config.read_timeout)?;
    stream.set_write_timeout(config.write_timeout)?;

    tracing::debug!(
        "Connected to {} (local {})",
        addr,
        stream
            .local_addr()
            .map_or_else(|_| "unknown".to_string(), |a| a.to_string())
    );

    Ok(stream)
}
