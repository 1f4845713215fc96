//! Cancellation of the accept loop
//!
//! Signal handlers only store into [`SIGNALLED`]. Everything else happens in
//! the accept loop once it observes the flag through a [`ShutdownToken`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use signal_hook::consts::{SIGINT, SIGTERM};

use crate::error::{Error, Result};
use crate::log;

lazy_static! {
    static ref SIGNALLED: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
}

/// Routes `SIGINT` and `SIGTERM` into the shutdown flag instead of ending
/// the process.
///
/// # Errors
///
/// [`Error::Io`] if a handler cannot be installed.
pub fn install_signal_handlers() -> Result<()> {
    for signal in [SIGINT, SIGTERM] {
        let _ = signal_hook::flag::register(signal, Arc::clone(&SIGNALLED))
            .map_err(|err| Error::io("register signal handler", err))?;
    }
    log::debug!("signal handlers installed");
    Ok(())
}

/// Cancellation flag shared between the accept loop and whoever stops it.
///
/// Clones observe the same flag. A token made by
/// [`from_signals`](ShutdownToken::from_signals) also reports cancellation
/// once `SIGINT` or `SIGTERM` arrived.
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
    follow_signals: bool,
}

impl ShutdownToken {
    /// Token cancelled only through [`cancel`](Self::cancel).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that is also cancelled by the signals routed with
    /// [`install_signal_handlers`].
    #[must_use]
    pub fn from_signals() -> Self {
        Self {
            cancelled: Arc::default(),
            follow_signals: true,
        }
    }

    /// Requests shutdown.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// `true` once shutdown was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || (self.follow_signals && SIGNALLED.load(Ordering::SeqCst))
    }
}
