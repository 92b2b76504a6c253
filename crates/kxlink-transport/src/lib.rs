//! # kxlink Transport
//!
//! Byte-stream transport layer for the kxlink protocol.
//!
//! This crate provides:
//! - [`write_all`] / [`read_exact`]: all-or-nothing transfers over a channel
//!   that may accept or deliver partial buffers
//! - [`tcp::connect`]: blocking TCP connect with optional deadlines
//! - [`CountingChannel`]: byte and operation counters for diagnostics
//!
//! Everything is blocking and single-owner. A single I/O failure is terminal
//! for the connection; nothing here retries.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod stats;
pub mod stream;
pub mod tcp;

use std::time::Duration;

pub use error::{StreamError, StreamResult};
pub use stats::{CountingChannel, StreamStats};
pub use stream::{Channel, read_exact, read_exact_into, write_all};

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connect timeout (`None` = OS default)
    pub connect_timeout: Option<Duration>,
    /// Per-read deadline (`None` = block indefinitely)
    pub read_timeout: Option<Duration>,
    /// Per-write deadline (`None` = block indefinitely)
    pub write_timeout: Option<Duration>,
    /// Disable Nagle's algorithm
    pub nodelay: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(10)),
            read_timeout: None,
            write_timeout: None,
            nodelay: true,
        }
    }
}
