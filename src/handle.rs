//! Single-owner wrapper of an OS network descriptor

use std::os::unix::io::{AsRawFd, RawFd};

use crate::log;

/// Raw descriptor value of an empty [`Handle`].
pub const INVALID_DESCRIPTOR: RawFd = -1;

/// Owns at most one OS socket descriptor.
///
/// The descriptor is closed exactly once: when the `Handle` is dropped or
/// [`reset`](Handle::reset), unless ownership was handed off with
/// [`release`](Handle::release) before. `Handle` is deliberately not `Clone`.
#[derive(Debug, Default)]
pub struct Handle {
    socket: Option<socket2::Socket>,
}

impl Handle {
    /// Takes ownership of `socket`.
    #[must_use]
    pub fn acquire(socket: socket2::Socket) -> Self {
        Self {
            socket: Some(socket),
        }
    }

    /// A handle owning nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` while a descriptor is owned.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.socket.is_some()
    }

    /// Owned descriptor number, or [`INVALID_DESCRIPTOR`].
    #[must_use]
    pub fn raw(&self) -> RawFd {
        self.socket
            .as_ref()
            .map_or(INVALID_DESCRIPTOR, AsRawFd::as_raw_fd)
    }

    /// Borrow the owned socket.
    #[must_use]
    pub fn socket(&self) -> Option<&socket2::Socket> {
        self.socket.as_ref()
    }

    /// Gives up ownership without closing. The handle is empty afterwards.
    #[must_use = "dropping the released socket closes it"]
    pub fn release(&mut self) -> Option<socket2::Socket> {
        self.socket.take()
    }

    /// Closes the owned descriptor, if any, and takes `socket` instead.
    pub fn reset(&mut self, socket: Option<socket2::Socket>) {
        if let Some(old) = self.socket.take() {
            log::trace!("closing descriptor {}", old.as_raw_fd());
            drop(old);
        }
        self.socket = socket;
    }
}

impl AsRawFd for Handle {
    fn as_raw_fd(&self) -> RawFd {
        self.raw()
    }
}

impl From<socket2::Socket> for Handle {
    fn from(socket: socket2::Socket) -> Self {
        Self::acquire(socket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_socket() -> socket2::Socket {
        socket2::Socket::new(socket2::Domain::IPV4, socket2::Type::STREAM, None).unwrap()
    }

    #[test]
    fn empty_handle_is_invalid() {
        let mut handle = Handle::empty();
        assert!(!handle.is_valid());
        assert_eq!(handle.raw(), INVALID_DESCRIPTOR);
        handle.reset(None);
        assert!(handle.release().is_none());
    }

    #[test]
    fn release_hands_off_without_closing() {
        let mut handle = Handle::acquire(stream_socket());
        let fd = handle.raw();
        assert!(fd >= 0);

        let socket = handle.release().unwrap();
        assert!(!handle.is_valid());
        assert_eq!(socket.as_raw_fd(), fd);
        // still a live socket
        assert!(socket.r#type().is_ok());

        let moved = Handle::from(socket);
        assert_eq!(moved.raw(), fd);
    }

    #[test]
    fn reset_replaces_descriptor() {
        let mut handle = Handle::acquire(stream_socket());
        let replacement = stream_socket();
        let new_fd = replacement.as_raw_fd();
        handle.reset(Some(replacement));
        assert_eq!(handle.raw(), new_fd);
        handle.reset(None);
        handle.reset(None);
        assert!(!handle.is_valid());
    }
}
