//! Byte counters for a channel.

use std::io::{self, Read, Write};

/// Transport statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total bytes received
    pub bytes_received: u64,
    /// Successful write calls
    pub writes: u64,
    /// Successful read calls (including end-of-stream)
    pub reads: u64,
    /// Failed write calls
    pub write_errors: u64,
    /// Failed read calls
    pub read_errors: u64,
}

impl StreamStats {
    /// Create new empty statistics
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful write
    pub fn record_write(&mut self, bytes: usize) {
        self.bytes_sent += bytes as u64;
        self.writes += 1;
    }

    /// Record a successful read
    pub fn record_read(&mut self, bytes: usize) {
        self.bytes_received += bytes as u64;
        self.reads += 1;
    }
}

/// Channel wrapper that counts traffic.
#[derive(Debug)]
pub struct CountingChannel<C> {
    inner: C,
    stats: StreamStats,
}

impl<C> CountingChannel<C> {
    /// Wrap a channel.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            stats: StreamStats::new(),
        }
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Borrow the wrapped channel.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Mutably borrow the wrapped channel.
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Unwrap, discarding the counters.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Read> Read for CountingChannel<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(n) => {
                self.stats.record_read(n);
                Ok(n)
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::Interrupted {
                    self.stats.read_errors += 1;
                }
                Err(e)
            }
        }
    }
}

impl<C: Write> Write for CountingChannel<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.write(buf) {
            Ok(n) => {
                self.stats.record_write(n);
                Ok(n)
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::Interrupted {
                    self.stats.write_errors += 1;
                }
                Err(e)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{read_exact, write_all};
    use std::io::Cursor;

    #[test]
    fn test_stream_stats() {
        let mut stats = StreamStats::new();
        assert_eq!(stats.bytes_sent, 0);

        stats.record_write(100);
        assert_eq!(stats.bytes_sent, 100);
        assert_eq!(stats.writes, 1);

        stats.record_read(200);
        assert_eq!(stats.bytes_received, 200);
        assert_eq!(stats.reads, 1);
    }

    #[test]
    fn test_counting_channel_read() {
        let mut channel = CountingChannel::new(Cursor::new(vec![9u8; 48]));

        read_exact(&mut channel, 32).unwrap();
        read_exact(&mut channel, 16).unwrap();

        let stats = channel.stats();
        assert_eq!(stats.bytes_received, 48);
        assert_eq!(stats.read_errors, 0);
    }

    #[test]
    fn test_counting_channel_write() {
        let mut channel = CountingChannel::new(Vec::new());

        write_all(&mut channel, b"public key bytes").unwrap();

        assert_eq!(channel.stats().bytes_sent, 16);
        assert_eq!(channel.into_inner(), b"public key bytes");
    }
}
