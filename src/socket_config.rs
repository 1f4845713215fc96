use std::time::Duration;

/// Name of the failing socket option with the OS error
pub(crate) type OptionError = (&'static str, std::io::Error);

/// Options applied to a [`Transport`](crate::Transport) with
/// [`set_options`](crate::Transport::set_options).
///
/// # Defaults
///
/// `reuse_addr`: true
/// `reuse_port`: false
/// `keep_alive`: false
/// `no_delay`: false
/// `blocking`: true
/// `send_timeout`, `recv_timeout`: None (block indefinitely)
/// `send_buffer_size`, `recv_buffer_size`: None (OS default)
///
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(missing_docs, clippy::struct_excessive_bools)]
pub struct SocketOptions {
    pub reuse_addr: bool,
    pub reuse_port: bool,
    pub keep_alive: bool,
    pub no_delay: bool,
    pub blocking: bool,
    /// `SO_SNDTIMEO`, zero durations are ignored
    pub send_timeout: Option<Duration>,
    /// `SO_RCVTIMEO`, zero durations are ignored
    pub recv_timeout: Option<Duration>,
    pub send_buffer_size: Option<usize>,
    pub recv_buffer_size: Option<usize>,
}

impl SocketOptions {
    /// Applies every option to `socket`, stopping at the first failure.
    ///
    /// `TCP_NODELAY` is only touched for stream sockets.
    #[inline]
    pub(crate) fn apply(&self, socket: &socket2::Socket, stream: bool) -> Result<(), OptionError> {
        fn tag<T>(name: &'static str, r: std::io::Result<T>) -> Result<T, OptionError> {
            r.map_err(|err| (name, err))
        }

        tag("SO_REUSEADDR", socket.set_reuse_address(self.reuse_addr))?;
        tag("SO_REUSEPORT", socket.set_reuse_port(self.reuse_port))?;
        tag("SO_KEEPALIVE", socket.set_keepalive(self.keep_alive))?;
        if stream {
            tag("TCP_NODELAY", socket.set_nodelay(self.no_delay))?;
        }
        tag("O_NONBLOCK", socket.set_nonblocking(!self.blocking))?;
        if let Some(timeout) = self.send_timeout.filter(|t| !t.is_zero()) {
            tag("SO_SNDTIMEO", socket.set_write_timeout(Some(timeout)))?;
        }
        if let Some(timeout) = self.recv_timeout.filter(|t| !t.is_zero()) {
            tag("SO_RCVTIMEO", socket.set_read_timeout(Some(timeout)))?;
        }
        if let Some(size) = self.send_buffer_size {
            tag("SO_SNDBUF", socket.set_send_buffer_size(size))?;
        }
        if let Some(size) = self.recv_buffer_size {
            tag("SO_RCVBUF", socket.set_recv_buffer_size(size))?;
        }
        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            reuse_addr: true,
            reuse_port: false,
            keep_alive: false,
            no_delay: false,
            blocking: true,
            send_timeout: None,
            recv_timeout: None,
            send_buffer_size: None,
            recv_buffer_size: None,
        }
    }
}
