//! Transport error types.

use std::io;

/// Transport layer errors
///
/// Every variant is fatal for the connection it occurred on.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Peer closed the stream before the requested bytes arrived
    #[error("connection closed after {received} of {expected} bytes")]
    Closed {
        /// Bytes requested
        expected: usize,
        /// Bytes received before the close
        received: usize,
    },

    /// Transport accepted zero bytes on write
    #[error("transport accepted no data after {written} of {expected} bytes")]
    WriteZero {
        /// Bytes requested
        expected: usize,
        /// Bytes written before the stall
        written: usize,
    },

    /// Connection could not be established
    #[error("connect to {addr} failed: {source}")]
    Connect {
        /// Target address
        addr: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// I/O error from the underlying transport
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StreamError {
    /// Whether the peer closed the stream (as opposed to a local or OS error).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

/// Result type for transport operations
pub type StreamResult<T> = Result<T, StreamError>;
