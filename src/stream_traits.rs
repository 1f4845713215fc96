//! Byte-level primitives the framing layer is built on

use crate::error::Result;

/// Raw receive primitive of a byte stream.
///
/// Implemented by [`Transport`](crate::Transport). Framing in
/// [`read_until`](crate::read_until) only depends on this trait, so it can be
/// driven by any source delivering bytes in arbitrarily sized pieces.
pub trait Receive {
    /// Receives up to `buf.len()` bytes.
    ///
    /// `Ok(0)` signals orderly shutdown by the peer (for a non-empty `buf`).
    ///
    /// # Errors
    ///
    /// Failures of the underlying OS call.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<T: Receive + ?Sized> Receive for &mut T {
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).receive(buf)
    }
}
