//! Readiness multiplexer over [`mio::Poll`]
//!
//! mio reports edge-triggered readiness. Descriptors reported by one
//! [`Poll::poll`] are re-armed before the next wait, so a descriptor that
//! stays ready is reported again, as with `poll(2)`.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::ops::BitOr;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use mio::event::Event;
use mio::unix::SourceFd;
use mio::{Events, Token};

use crate::error::{Error, Result};
use crate::log;

/// Events collected by one wait
const EVENTS_CAPACITY: usize = 64;

/// Readiness a descriptor is registered for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Interest(mio::Interest);

impl Interest {
    /// Data can be read, or a connection accepted
    pub const READABLE: Interest = Interest(mio::Interest::READABLE);
    /// Data can be written
    pub const WRITABLE: Interest = Interest(mio::Interest::WRITABLE);

    /// `true` if readability is of interest
    #[must_use]
    pub fn is_readable(self) -> bool {
        self.0.is_readable()
    }

    /// `true` if writability is of interest
    #[must_use]
    pub fn is_writable(self) -> bool {
        self.0.is_writable()
    }
}

impl BitOr for Interest {
    type Output = Interest;

    fn bitor(self, rhs: Self) -> Self::Output {
        Interest(self.0 | rhs.0)
    }
}

/// Readiness reported for one descriptor by [`Poll::poll`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Readiness(u8);

impl Readiness {
    const READABLE: u8 = 0b0001;
    const WRITABLE: u8 = 0b0010;
    const ERROR: u8 = 0b0100;
    const HANGUP: u8 = 0b1000;

    /// Data can be read, a connection accepted, or the peer closed
    #[must_use]
    pub const fn is_readable(self) -> bool {
        self.0 & Self::READABLE != 0
    }

    /// Data can be written
    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.0 & Self::WRITABLE != 0
    }

    /// Error condition on the descriptor
    #[must_use]
    pub const fn is_error(self) -> bool {
        self.0 & Self::ERROR != 0
    }

    /// Peer hung up
    #[must_use]
    pub const fn is_hangup(self) -> bool {
        self.0 & Self::HANGUP != 0
    }
}

impl From<&Event> for Readiness {
    fn from(event: &Event) -> Self {
        let mut bits = 0;
        if event.is_readable() {
            bits |= Self::READABLE;
        }
        if event.is_writable() {
            bits |= Self::WRITABLE;
        }
        if event.is_error() {
            bits |= Self::ERROR;
        }
        if event.is_read_closed() || event.is_write_closed() {
            bits |= Self::HANGUP;
        }
        Readiness(bits)
    }
}

/// Callback run by [`Poll::process_events`]
pub type Callback = Box<dyn FnMut(RawFd, Readiness)>;

struct Entry {
    interest: Interest,
    callback: Callback,
}

/// Registry of descriptors with interest sets and callbacks.
///
/// [`poll`](Poll::poll) waits for readiness and records it,
/// [`process_events`](Poll::process_events) runs the callbacks of everything
/// recorded. The two are separate so a callback may change the registry.
pub struct Poll {
    poll: mio::Poll,
    events: Events,
    entries: HashMap<RawFd, Entry>,
    pending: Vec<(RawFd, Readiness)>,
    rearm: Vec<RawFd>,
}

impl Poll {
    /// Empty registry
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the OS selector cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self {
            poll: mio::Poll::new().map_err(|err| Error::io("create poll", err))?,
            events: Events::with_capacity(EVENTS_CAPACITY),
            entries: HashMap::new(),
            pending: Vec::new(),
            rearm: Vec::new(),
        })
    }

    /// Registers `fd`. A descriptor registered already gets the new interest
    /// set and callback.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a negative descriptor
    /// - [`Error::Io`] if the OS rejects the registration
    pub fn add<F>(&mut self, fd: RawFd, interest: Interest, callback: F) -> Result<()>
    where
        F: FnMut(RawFd, Readiness) + 'static,
    {
        if self.entries.contains_key(&fd) {
            self.reregister(fd, interest)?;
        } else {
            let token = token(fd)?;
            self.poll
                .registry()
                .register(&mut SourceFd(&fd), token, interest.0)
                .map_err(|err| Error::io("register", err))?;
        }
        let _ = self.entries.insert(
            fd,
            Entry {
                interest,
                callback: Box::new(callback),
            },
        );
        Ok(())
    }

    /// [`add`](Self::add) for anything owning a descriptor, e.g. a
    /// [`Transport`](crate::Transport).
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn add_source<S, F>(&mut self, source: &S, interest: Interest, callback: F) -> Result<()>
    where
        S: AsRawFd + ?Sized,
        F: FnMut(RawFd, Readiness) + 'static,
    {
        self.add(source.as_raw_fd(), interest, callback)
    }

    /// Changes the interest set of `fd`. Unknown descriptors are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the OS rejects the change.
    pub fn modify(&mut self, fd: RawFd, interest: Interest) -> Result<()> {
        if !self.entries.contains_key(&fd) {
            return Ok(());
        }
        self.reregister(fd, interest)?;
        if let Some(entry) = self.entries.get_mut(&fd) {
            entry.interest = interest;
        }
        Ok(())
    }

    /// Unregisters `fd`. Unknown descriptors are ignored.
    pub fn remove(&mut self, fd: RawFd) {
        if self.entries.remove(&fd).is_none() {
            return;
        }
        // closing a descriptor already dropped it from the selector
        if let Err(err) = self.poll.registry().deregister(&mut SourceFd(&fd)) {
            log::trace!("deregister {fd}: {err}");
        }
        self.pending.retain(|(pending, _)| *pending != fd);
        self.rearm.retain(|rearm| *rearm != fd);
    }

    /// Waits until a registered descriptor is ready or `timeout` elapses.
    ///
    /// `None` waits indefinitely, a zero duration only checks, and shorter
    /// than a millisecond is rounded up rather than down. Returns the number
    /// of ready descriptors; a wait interrupted by a signal counts as a
    /// timeout.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if waiting fails.
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<usize> {
        self.pending.clear();
        for fd in std::mem::take(&mut self.rearm) {
            if let Some(interest) = self.entries.get(&fd).map(|e| e.interest) {
                self.reregister(fd, interest)?;
            }
        }

        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                log::trace!("poll interrupted");
                return Ok(0);
            }
            Err(err) => return Err(Error::io("poll", err)),
        }

        for event in &self.events {
            let Ok(fd) = RawFd::try_from(event.token().0) else {
                continue;
            };
            let readiness = Readiness::from(event);
            match self.pending.iter_mut().find(|(pending, _)| *pending == fd) {
                Some((_, seen)) => seen.0 |= readiness.0,
                None => self.pending.push((fd, readiness)),
            }
        }
        self.rearm.extend(self.pending.iter().map(|(fd, _)| *fd));
        Ok(self.pending.len())
    }

    /// Runs the callback of every descriptor reported ready by the last
    /// [`poll`](Self::poll), each once.
    pub fn process_events(&mut self) {
        for (fd, readiness) in std::mem::take(&mut self.pending) {
            if let Some(entry) = self.entries.get_mut(&fd) {
                (entry.callback)(fd, readiness);
            }
        }
    }

    /// Number of registered descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` if `fd` is registered
    #[must_use]
    pub fn contains(&self, fd: RawFd) -> bool {
        self.entries.contains_key(&fd)
    }

    /// Modifies the registration of `fd`, which also re-arms its readiness.
    /// A descriptor closed and reopened under the same number is registered
    /// afresh.
    fn reregister(&self, fd: RawFd, interest: Interest) -> Result<()> {
        let registry = self.poll.registry();
        let token = token(fd)?;
        match registry.reregister(&mut SourceFd(&fd), token, interest.0) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                registry.register(&mut SourceFd(&fd), token, interest.0)
            }
            result => result,
        }
        .map_err(|err| Error::io("reregister", err))
    }
}

fn token(fd: RawFd) -> Result<Token> {
    usize::try_from(fd)
        .map(Token)
        .map_err(|_| Error::InvalidArgument("negative descriptor"))
}

impl fmt::Debug for Poll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poll")
            .field("fds", &self.entries.keys().collect::<Vec<_>>())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::rc::Rc;
    use std::time::Instant;

    use super::*;

    type Seen = Rc<RefCell<Vec<(RawFd, Readiness)>>>;

    fn recorder(seen: &Seen) -> impl FnMut(RawFd, Readiness) + 'static {
        let seen = Rc::clone(seen);
        move |fd, r| seen.borrow_mut().push((fd, r))
    }

    #[test]
    fn readable_after_write() {
        let (mut a, b) = UnixStream::pair().unwrap();
        let seen = Seen::default();
        let mut poll = Poll::new().unwrap();
        poll.add_source(&b, Interest::READABLE, recorder(&seen)).unwrap();

        assert_eq!(poll.poll(Some(Duration::ZERO)).unwrap(), 0);
        poll.process_events();
        assert!(seen.borrow().is_empty());

        a.write_all(b"x").unwrap();
        assert_eq!(poll.poll(Some(Duration::from_secs(5))).unwrap(), 1);
        poll.process_events();
        poll.process_events();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, b.as_raw_fd());
        assert!(seen[0].1.is_readable());
        assert!(!seen[0].1.is_error());
    }

    #[test]
    fn unread_data_reported_again() {
        let (mut a, b) = UnixStream::pair().unwrap();
        let mut poll = Poll::new().unwrap();
        poll.add_source(&b, Interest::READABLE, |_, _| {}).unwrap();

        a.write_all(b"x").unwrap();
        assert_eq!(poll.poll(Some(Duration::from_secs(5))).unwrap(), 1);
        assert_eq!(poll.poll(Some(Duration::from_secs(5))).unwrap(), 1);
        assert!(poll.pending[0].1.is_readable());
    }

    #[test]
    fn hangup_reported() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut poll = Poll::new().unwrap();
        poll.add_source(&b, Interest::READABLE, |_, _| {}).unwrap();
        drop(a);
        assert_eq!(poll.poll(Some(Duration::from_secs(5))).unwrap(), 1);
        let (_, readiness) = poll.pending[0];
        assert!(readiness.is_hangup() || readiness.is_readable());
    }

    #[test]
    fn re_adding_replaces_interest() {
        let (_a, b) = UnixStream::pair().unwrap();
        let seen = Seen::default();
        let mut poll = Poll::new().unwrap();
        let fd = b.as_raw_fd();

        poll.add(fd, Interest::READABLE, |_, _| {}).unwrap();
        poll.add(fd, Interest::WRITABLE, recorder(&seen)).unwrap();
        assert_eq!(poll.len(), 1);

        // a fresh socket is writable at once
        assert_eq!(poll.poll(Some(Duration::from_secs(5))).unwrap(), 1);
        poll.process_events();
        assert!(seen.borrow()[0].1.is_writable());

        poll.modify(fd, Interest::READABLE).unwrap();
        assert_eq!(poll.poll(Some(Duration::ZERO)).unwrap(), 0);
    }

    #[test]
    fn remove_and_modify_unknown_are_noops() {
        let mut poll = Poll::new().unwrap();
        poll.remove(12345);
        let both = Interest::READABLE | Interest::WRITABLE;
        poll.modify(12345, both).unwrap();
        assert!(poll.is_empty());
        assert!(!poll.contains(12345));

        let (_a, b) = UnixStream::pair().unwrap();
        poll.add_source(&b, Interest::READABLE, |_, _| {}).unwrap();
        assert!(poll.contains(b.as_raw_fd()));
        poll.remove(b.as_raw_fd());
        poll.remove(b.as_raw_fd());
        assert!(poll.is_empty());
    }

    #[test]
    fn negative_descriptor_rejected() {
        let mut poll = Poll::new().unwrap();
        assert!(matches!(
            poll.add(-1, Interest::READABLE, |_, _| {}),
            Err(Error::InvalidArgument(_))
        ));
        assert!(poll.is_empty());
    }

    #[test]
    fn timeout_bounds_the_wait() {
        let (_a, b) = UnixStream::pair().unwrap();
        let mut poll = Poll::new().unwrap();
        poll.add_source(&b, Interest::READABLE, |_, _| {}).unwrap();
        let start = Instant::now();
        assert_eq!(poll.poll(Some(Duration::from_millis(50))).unwrap(), 0);
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn sub_millisecond_timeout_still_waits() {
        let (_a, b) = UnixStream::pair().unwrap();
        let mut poll = Poll::new().unwrap();
        poll.add_source(&b, Interest::READABLE, |_, _| {}).unwrap();
        let start = Instant::now();
        assert_eq!(poll.poll(Some(Duration::from_micros(300))).unwrap(), 0);
        assert!(start.elapsed() >= Duration::from_micros(300));
    }

    #[test]
    fn interest_flags() {
        let both = Interest::READABLE | Interest::WRITABLE;
        assert!(both.is_readable() && both.is_writable());
        assert!(!Interest::READABLE.is_writable());
    }
}
