//! Delimiter framing over a raw [`Receive`] source
//!
//! Bytes are pulled one at a time so nothing past the delimiter is consumed:
//! whatever follows stays in the source for the next reader.

use crate::error::{Error, Result};
use crate::stream_traits::Receive;

/// Default maximum frame length
pub const MAX_FRAME_LEN_DEFAULT: usize = 4096;

/// Reads from `source` until the accumulated bytes end with `delimiter`.
///
/// Stops early when `max_length` bytes are accumulated or the peer closes the
/// stream. The returned bytes include the delimiter if it was found, so
/// callers tell a complete frame from a truncated one with
/// `frame.ends_with(delimiter)`.
///
/// # Errors
///
/// - [`Error::InvalidArgument`] for an empty `delimiter`
/// - any error of [`Receive::receive`]
pub fn read_until<R: Receive + ?Sized>(
    source: &mut R,
    delimiter: &[u8],
    max_length: usize,
) -> Result<Vec<u8>> {
    if delimiter.is_empty() {
        return Err(Error::InvalidArgument("empty frame delimiter"));
    }

    let mut frame = Vec::with_capacity(max_length.min(256));
    let mut byte = [0u8; 1];

    while frame.len() < max_length {
        if source.receive(&mut byte)? == 0 {
            break;
        }
        frame.push(byte[0]);
        if frame.ends_with(delimiter) {
            break;
        }
    }

    Ok(frame)
}

/// [`read_until`] with a single `\n` as delimiter.
///
/// # Errors
///
/// See [`read_until`].
pub fn read_line<R: Receive + ?Sized>(source: &mut R, max_length: usize) -> Result<Vec<u8>> {
    read_until(source, b"\n", max_length)
}
