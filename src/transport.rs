//! State-checked socket transport
//!
//! A [`Transport`] owns one [`Handle`] and only forwards an operation to the
//! OS when its lifecycle [`State`] allows it:
//!
//! ```text
//! Created --bind--> Bound --listen--> Listening --accept--> (new Connected)
//! Created --connect--> Connected
//! any --close--> Closed
//! ```
//!
//! Every OS failure is returned as [`Error::Io`] and remembered as
//! [`last_error`](Transport::last_error).

use std::fmt;
use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket};

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::log;
use crate::socket_config::SocketOptions;
use crate::stream_traits::Receive;
use crate::util::line_reader;

#[cfg(any(target_os = "linux", target_os = "android"))]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SEND_FLAGS: libc::c_int = 0;

/// Protocol type of a [`Transport`]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    /// TCP
    Stream,
    /// UDP, can be created and bound but offers no datagram I/O
    Datagram,
}

impl Type {
    fn native(self) -> (socket2::Type, Protocol) {
        match self {
            Type::Stream => (socket2::Type::STREAM, Protocol::TCP),
            Type::Datagram => (socket2::Type::DGRAM, Protocol::UDP),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Type::Stream => "stream",
            Type::Datagram => "datagram",
        })
    }
}

/// Lifecycle state of a [`Transport`]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum State {
    /// descriptor allocated, nothing else done
    Created,
    /// bound to a local endpoint
    Bound,
    /// accepting connections
    Listening,
    /// connected to a peer, either by `connect` or by `accept`
    Connected,
    /// shut down or closed
    Closed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Socket with a validated lifecycle.
#[derive(Debug)]
pub struct Transport {
    handle: Handle,
    kind: Type,
    state: State,
    last_error: Option<io::Error>,
}

impl Transport {
    /// Allocates a new IPv4 socket of `kind`.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the OS refuses a descriptor.
    pub fn create(kind: Type) -> Result<Self> {
        let (ty, protocol) = kind.native();
        let socket =
            Socket::new(Domain::IPV4, ty, Some(protocol)).map_err(|err| Error::io("socket", err))?;
        log::trace!("created {kind} transport {}", socket.as_raw_fd());
        Ok(Self::from_parts(Handle::acquire(socket), kind, State::Created))
    }

    /// [`create`](Self::create) followed by [`bind`](Self::bind).
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create) and [`bind`](Self::bind).
    pub fn create_bind(addr: &Endpoint, kind: Type) -> Result<Self> {
        let mut transport = Self::create(kind)?;
        transport.bind(addr)?;
        Ok(transport)
    }

    /// [`create`](Self::create) followed by [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create) and [`connect`](Self::connect).
    pub fn create_connect(addr: &Endpoint, kind: Type) -> Result<Self> {
        let mut transport = Self::create(kind)?;
        transport.connect(addr)?;
        Ok(transport)
    }

    fn from_parts(handle: Handle, kind: Type, state: State) -> Self {
        Self {
            handle,
            kind,
            state,
            last_error: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Protocol type.
    #[must_use]
    pub fn kind(&self) -> Type {
        self.kind
    }

    /// `true` while the handle owns a descriptor.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Descriptor number, negative once closed.
    #[must_use]
    pub fn raw_handle(&self) -> RawFd {
        self.handle.raw()
    }

    /// Last error reported by the OS for this transport.
    #[must_use]
    pub fn last_error(&self) -> Option<&io::Error> {
        self.last_error.as_ref()
    }

    /// Applies `options` to the socket.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] when closed
    /// - [`Error::Io`] naming the first option the OS rejected
    pub fn set_options(&mut self, options: &SocketOptions) -> Result<()> {
        let stream = self.kind == Type::Stream;
        let result = options.apply(self.require("set options on", &[])?, stream);
        result.map_err(|(name, err)| self.os_error(name, err))
    }

    /// Bounds how long [`receive`](Self::receive) blocks; `None` blocks
    /// until data or end of stream. A receive running out of time fails
    /// with [`io::ErrorKind::WouldBlock`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] when closed
    /// - [`Error::Io`]
    pub fn set_receive_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        let result = self
            .require("set receive timeout on", &[])?
            .set_read_timeout(timeout);
        result.map_err(|err| self.os_error("SO_RCVTIMEO", err))
    }

    /// Binds to `addr`. Legal only in `Created`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] outside `Created`
    /// - [`Error::Io`], e.g. address in use
    pub fn bind(&mut self, addr: &Endpoint) -> Result<()> {
        let result = self.require("bind", &[State::Created])?.bind(&addr.to_native());
        result.map_err(|err| self.os_error("bind", err))?;
        log::debug!("transport {} bound to {addr}", self.raw_handle());
        self.state = State::Bound;
        Ok(())
    }

    /// Starts accepting connections. Legal only for bound stream transports.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedOperation`] for datagram transports
    /// - [`Error::InvalidState`] outside `Bound`
    /// - [`Error::Io`]
    pub fn listen(&mut self, backlog: i32) -> Result<()> {
        if self.kind != Type::Stream {
            self.last_error = Some(io::Error::from(io::ErrorKind::Unsupported));
            return Err(Error::UnsupportedOperation {
                op: "listen",
                kind: self.kind,
            });
        }
        let result = self.require("listen on", &[State::Bound])?.listen(backlog);
        result.map_err(|err| self.os_error("listen", err))?;
        self.state = State::Listening;
        Ok(())
    }

    /// Waits for the next connection.
    ///
    /// Returns the connected transport and the peer endpoint. The state is
    /// checked before any OS call is made.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless `Listening`
    /// - [`Error::Io`]
    pub fn accept(&mut self) -> Result<(Transport, Endpoint)> {
        let result = self.require("accept on", &[State::Listening])?.accept();
        let (socket, native) = result.map_err(|err| self.os_error("accept", err))?;
        let peer = Endpoint::from_native(&native)?;
        log::trace!("accepted {} from {peer}", socket.as_raw_fd());
        Ok((
            Self::from_parts(Handle::acquire(socket), self.kind, State::Connected),
            peer,
        ))
    }

    /// Connects to `addr`. Legal only in `Created`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] outside `Created`
    /// - [`Error::Io`], e.g. connection refused
    pub fn connect(&mut self, addr: &Endpoint) -> Result<()> {
        let result = self
            .require("connect", &[State::Created])?
            .connect(&addr.to_native());
        result.map_err(|err| self.os_error("connect", err))?;
        self.state = State::Connected;
        Ok(())
    }

    /// Sends bytes of `data` with a single OS call and returns how many were
    /// transferred, which may be fewer than requested.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless `Connected`
    /// - [`Error::Io`]
    pub fn send(&mut self, data: &[u8]) -> Result<usize> {
        loop {
            let result = self
                .require("send on", &[State::Connected])?
                .send_with_flags(data, SEND_FLAGS);
            match result {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(self.os_error("send", err)),
            }
        }
    }

    /// Sends all of `data`, repeating partial sends.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send); a send accepting zero bytes is
    /// [`io::ErrorKind::WriteZero`].
    pub fn send_all(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            match self.send(data)? {
                0 => {
                    return Err(
                        self.os_error("send", io::Error::from(io::ErrorKind::WriteZero))
                    )
                }
                n => data = &data[n..],
            }
        }
        Ok(())
    }

    /// [`send_all`](Self::send_all) for text.
    ///
    /// # Errors
    ///
    /// See [`send_all`](Self::send_all).
    pub fn send_str(&mut self, text: &str) -> Result<()> {
        self.send_all(text.as_bytes())
    }

    /// Receives up to `buf.len()` bytes; `Ok(0)` means the peer shut down.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless `Connected`
    /// - [`Error::Io`]
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            let mut socket = self.require("receive on", &[State::Connected])?;
            match Read::read(&mut socket, buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(self.os_error("recv", err)),
            }
        }
    }

    /// One receive of at most `max_length` bytes.
    ///
    /// # Errors
    ///
    /// See [`receive`](Self::receive).
    pub fn receive_string(&mut self, max_length: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; max_length];
        let n = self.receive(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Reads up to and including the next `\n`, see [`read_line`](crate::read_line).
    ///
    /// # Errors
    ///
    /// See [`receive`](Self::receive).
    pub fn read_line(&mut self, max_length: usize) -> Result<Vec<u8>> {
        line_reader::read_line(self, max_length)
    }

    /// Reads up to and including `delimiter`, see [`read_until`](crate::read_until).
    ///
    /// # Errors
    ///
    /// See [`receive`](Self::receive).
    pub fn read_until(&mut self, delimiter: &[u8], max_length: usize) -> Result<Vec<u8>> {
        line_reader::read_until(self, delimiter, max_length)
    }

    /// Local endpoint of the socket.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] when closed
    /// - [`Error::Io`]
    pub fn local_addr(&self) -> Result<Endpoint> {
        let socket = self.require("query local address of", &[])?;
        let native = socket
            .local_addr()
            .map_err(|err| Error::io("getsockname", err))?;
        Endpoint::from_native(&native)
    }

    /// Endpoint of the connected peer.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] when closed
    /// - [`Error::Io`], e.g. not connected
    pub fn remote_addr(&self) -> Result<Endpoint> {
        let socket = self.require("query peer address of", &[])?;
        let native = socket
            .peer_addr()
            .map_err(|err| Error::io("getpeername", err))?;
        Endpoint::from_native(&native)
    }

    /// Shuts down the given directions without releasing the handle.
    ///
    /// Shutting down both directions moves the transport to `Closed`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if neither direction is requested
    /// - [`Error::InvalidState`] if the handle is not valid
    /// - [`Error::Io`]
    pub fn shutdown(&mut self, read: bool, write: bool) -> Result<()> {
        let how = match (read, write) {
            (true, true) => Shutdown::Both,
            (true, false) => Shutdown::Read,
            (false, true) => Shutdown::Write,
            (false, false) => {
                return Err(Error::InvalidArgument(
                    "shutdown needs the read or write direction",
                ))
            }
        };
        let result = self
            .handle
            .socket()
            .ok_or(Error::InvalidState {
                op: "shut down",
                state: self.state,
            })?
            .shutdown(how);
        result.map_err(|err| self.os_error("shutdown", err))?;
        if how == Shutdown::Both {
            self.state = State::Closed;
        }
        Ok(())
    }

    /// Releases the descriptor. Calling it again, or on a transport whose
    /// handle was never valid, does nothing.
    pub fn close(&mut self) {
        if self.handle.is_valid() {
            log::trace!("closing transport {}", self.handle.raw());
        }
        self.handle.reset(None);
        self.state = State::Closed;
    }

    /// Gives up the socket without closing it; the transport is `Closed` afterwards.
    #[must_use = "dropping the released socket closes it"]
    pub fn into_socket(mut self) -> Option<Socket> {
        self.state = State::Closed;
        self.handle.release()
    }

    /// Socket if the state is one of `allowed` (any but `Closed` when empty)
    /// and the handle is valid.
    fn require(&self, op: &'static str, allowed: &[State]) -> Result<&Socket> {
        let state_ok = if allowed.is_empty() {
            self.state != State::Closed
        } else {
            allowed.contains(&self.state)
        };
        match self.handle.socket() {
            Some(socket) if state_ok => Ok(socket),
            _ => Err(Error::InvalidState {
                op,
                state: self.state,
            }),
        }
    }

    fn os_error(&mut self, op: &'static str, err: io::Error) -> Error {
        log::debug!("transport {} {op}: {err}", self.handle.raw());
        self.last_error = Some(duplicate(&err));
        Error::io(op, err)
    }
}

fn duplicate(err: &io::Error) -> io::Error {
    err.raw_os_error().map_or_else(
        || io::Error::new(err.kind(), err.to_string()),
        io::Error::from_raw_os_error,
    )
}

impl AsRawFd for Transport {
    fn as_raw_fd(&self) -> RawFd {
        self.raw_handle()
    }
}

impl Receive for Transport {
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        Transport::receive(self, buf)
    }
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.receive(buf).map_err(io::Error::from)
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
