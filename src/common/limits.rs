//! Limits used in connection handling and the accept loop
//!

use std::time::Duration;

use crate::util::MAX_FRAME_LEN_DEFAULT;

/// Default value for allowed size of a request header block
pub const HEADER_MAX_SIZE_DEFAULT: usize = MAX_FRAME_LEN_DEFAULT;
/// Default length of the pending connection queue
pub const BACKLOG_DEFAULT: i32 = 128;
/// Default longest time the accept loop waits before checking for shutdown
pub const ACCEPT_WAKE_INTERVAL_DEFAULT: Duration = Duration::from_millis(250);
/// Default wait for more client data while lingering before close
pub const LINGER_TIMEOUT_DEFAULT: Duration = Duration::from_millis(500);

/// [`Config`] for `limits`
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Allowed size of the header block, blank line included
    pub header_max_size: usize,
    /// Pending connection queue passed to `listen`
    pub backlog: i32,
    /// Longest wait for a connection between shutdown checks
    pub accept_wake_interval: Duration,
    /// Wait for the client to finish sending after its response, zero closes
    /// at once
    pub linger_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header_max_size: HEADER_MAX_SIZE_DEFAULT,
            backlog: BACKLOG_DEFAULT,
            accept_wake_interval: ACCEPT_WAKE_INTERVAL_DEFAULT,
            linger_timeout: LINGER_TIMEOUT_DEFAULT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_limit_is_frame_limit() {
        let config = Config::default();
        assert_eq!(config.header_max_size, MAX_FRAME_LEN_DEFAULT);
        assert_eq!(config.header_max_size, 4096);
        assert!(config.linger_timeout > Duration::ZERO);
    }
}
