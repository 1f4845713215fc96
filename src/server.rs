//! Serial accept loop

use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::common::limits;
use crate::connection::process_connection;
use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::log;
use crate::poll::{Interest, Poll};
use crate::serve_root::ServeRoot;
use crate::server_config::ServerConfig;
use crate::shutdown::ShutdownToken;
use crate::socket_config::SocketOptions;
use crate::transport::{Transport, Type};

/// Lowest port picked when probing
const PROBE_PORT_MIN: u16 = 1024;
/// Most bytes discarded from a client after its response
const LINGER_MAX_DRAIN: usize = 64 * 1024;
/// Lingering takes at most this many receive timeouts
const LINGER_MAX_TIME_FACTOR: u32 = 4;

/// The file server.
///
/// Owns the listening transport and serves one connection at a time, in
/// accept order, until its [`ShutdownToken`] is cancelled.
#[derive(Debug)]
pub struct Server {
    listener: Transport,
    local: Endpoint,
    root: ServeRoot,
    limits: limits::Config,
    shutdown: ShutdownToken,
}

impl Server {
    /// Binds and starts listening according to `config`.
    ///
    /// If the configured port is taken, up to `config.probe_attempts` random
    /// ports are tried.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if no socket can be created or no port is free
    /// - listen errors
    pub fn new(config: ServerConfig, shutdown: ShutdownToken) -> Result<Self> {
        let mut listener =
            bind_available(&config.addr, config.probe_attempts, &config.socket_options)?;
        listener.listen(config.limits.backlog)?;
        let local = listener.local_addr()?;
        log::info!("listening on {local}, serving {}", config.root.display());

        Ok(Self {
            listener,
            local,
            root: ServeRoot::new(config.root),
            limits: config.limits,
            shutdown,
        })
    }

    /// Endpoint actually listened on
    #[must_use]
    pub fn local_addr(&self) -> Endpoint {
        self.local
    }

    /// Another handle to the token stopping this server
    #[must_use]
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Accepts and serves connections until shutdown is requested, then
    /// closes the listener.
    ///
    /// Shutdown is checked before every wait for a client, at least once per
    /// `accept_wake_interval`, and after every connection. A request in
    /// progress is always finished. Failures of single connections are
    /// logged and never end the loop.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if waiting for clients fails.
    pub fn run(mut self) -> Result<()> {
        let ready = Rc::new(Cell::new(false));
        let mut poll = Poll::new()?;
        let flag = Rc::clone(&ready);
        poll.add_source(&self.listener, Interest::READABLE, move |_, readiness| {
            flag.set(readiness.is_readable() || readiness.is_error());
        })?;

        let result = loop {
            if self.shutdown.is_cancelled() {
                log::info!("shutdown requested");
                break Ok(());
            }
            if let Err(err) = poll.poll(Some(self.limits.accept_wake_interval)) {
                break Err(err);
            }
            poll.process_events();
            if ready.replace(false) {
                self.serve_next();
            }
        };

        self.listener.close();
        log::info!("stopped listening on {}", self.local);
        result
    }

    /// Accepts one client, answers it and closes it.
    fn serve_next(&mut self) {
        let (mut client, peer) = match self.listener.accept() {
            Ok(accepted) => accepted,
            Err(err) => {
                log::warn!("{err}");
                return;
            }
        };

        match process_connection(&mut client, &peer, &self.root, &self.limits) {
            Ok(status) => log::debug!("{peer} answered {status}"),
            Err(err) => log::warn!("{peer}: {err}"),
        }
        linger(&mut client, self.limits.linger_timeout);
        client.close();
    }
}

/// Ends the response with a FIN and discards what the client still sends,
/// so closing with unread data does not reset the connection before the
/// client has read the response.
///
/// Gives up after `timeout` without data, [`LINGER_MAX_TIME_FACTOR`] times
/// `timeout` in total, or [`LINGER_MAX_DRAIN`] discarded bytes.
fn linger(client: &mut Transport, timeout: Duration) {
    if timeout.is_zero()
        || client.shutdown(false, true).is_err()
        || client.set_receive_timeout(Some(timeout)).is_err()
    {
        return;
    }

    let deadline = Instant::now() + timeout * LINGER_MAX_TIME_FACTOR;
    let mut buf = [0u8; 512];
    let mut drained = 0;
    while drained < LINGER_MAX_DRAIN && Instant::now() < deadline {
        match client.receive(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => drained += n,
        }
    }
    log::trace!("drained {drained} bytes before close");
}

/// Binds a stream transport to `addr`, or to a random port of the same host
/// if that port is taken.
///
/// After the preferred port, up to `attempts` ports from `1024..=65535` are
/// tried. Port `0` is handed to the OS as is.
///
/// # Errors
///
/// - [`Error::Io`] if no socket can be created or options fail
/// - the last bind error once every attempt failed
pub fn bind_available(
    addr: &Endpoint,
    attempts: usize,
    options: &SocketOptions,
) -> Result<Transport> {
    let mut transport = Transport::create(Type::Stream)?;
    transport.set_options(options)?;

    let attempts = if addr.port() == 0 { 0 } else { attempts };
    let mut rng = rand::thread_rng();
    let candidates = std::iter::once(addr.port())
        .chain((0..attempts).map(|_| rng.gen_range(PROBE_PORT_MIN..=u16::MAX)));

    let mut last_error = None;
    for port in candidates {
        let candidate = addr.with_port(port);
        match transport.bind(&candidate) {
            Ok(()) => return Ok(transport),
            Err(err) => {
                log::debug!("port {port} unavailable: {err}");
                last_error = Some(err);
            }
        }
    }

    log::error!("no free port on {} after {attempts} attempts", addr.ip());
    Err(last_error.unwrap_or_else(|| {
        Error::io("bind", io::Error::from(io::ErrorKind::AddrInUse))
    }))
}

/// Port a server for `addr` would get: the preferred port if free,
/// otherwise a random free one.
///
/// The port is released again before returning, so another process may take
/// it in between; [`Server::new`] therefore binds directly.
///
/// # Errors
///
/// See [`bind_available`].
pub fn find_available_port(addr: &Endpoint, attempts: usize) -> Result<u16> {
    let transport = bind_available(addr, attempts, &SocketOptions::default())?;
    Ok(transport.local_addr()?.port())
}
