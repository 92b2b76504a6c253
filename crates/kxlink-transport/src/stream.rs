//! All-or-nothing reads and writes over a byte stream.
//!
//! The underlying channel may accept or return fewer bytes than asked for on
//! any call. These helpers loop until the full buffer has moved or the
//! channel fails; callers never see a partial result. `Interrupted` is
//! resumed in place; any other error ends the operation.

use std::io::{ErrorKind, Read, Write};

use crate::error::{StreamError, StreamResult};

/// Bidirectional ordered byte stream.
pub trait Channel: Read + Write {}

impl<T: Read + Write + ?Sized> Channel for T {}

/// Write every byte of `bytes`, then flush.
///
/// # Errors
///
/// Returns [`StreamError::WriteZero`] if the channel accepts nothing, or
/// [`StreamError::Io`] on any other failure.
pub fn write_all<W: Write + ?Sized>(channel: &mut W, bytes: &[u8]) -> StreamResult<()> {
    let mut written = 0;

    while written < bytes.len() {
        match channel.write(&bytes[written..]) {
            Ok(0) => {
                return Err(StreamError::WriteZero {
                    expected: bytes.len(),
                    written,
                });
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(StreamError::Io(e)),
        }
    }

    loop {
        match channel.flush() {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(StreamError::Io(e)),
        }
    }
}

/// Fill `buf` completely from the channel.
///
/// On error the contents of `buf` are unspecified and must not be used.
///
/// # Errors
///
/// Returns [`StreamError::Closed`] if the channel reaches end-of-stream
/// first, or [`StreamError::Io`] on any other failure.
pub fn read_exact_into<R: Read + ?Sized>(channel: &mut R, buf: &mut [u8]) -> StreamResult<()> {
    let mut received = 0;

    while received < buf.len() {
        match channel.read(&mut buf[received..]) {
            Ok(0) => {
                return Err(StreamError::Closed {
                    expected: buf.len(),
                    received,
                });
            }
            Ok(n) => received += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(StreamError::Io(e)),
        }
    }

    Ok(())
}

/// Read exactly `n` bytes.
///
/// `n` sizes an allocation, so it must already be bounded by the caller.
///
/// # Errors
///
/// Same as [`read_exact_into`]; no short buffer is ever returned.
pub fn read_exact<R: Read + ?Sized>(channel: &mut R, n: usize) -> StreamResult<Vec<u8>> {
    let mut buf = vec![0u8; n];
    read_exact_into(channel, &mut buf)?;
    Ok(buf)
}
