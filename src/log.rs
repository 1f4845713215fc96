#[cfg(feature = "log")]
pub(crate) use log::{debug, error, info, trace, warn};

#[cfg(not(feature = "log"))]
macro_rules! log_mock {
    (target: $target:expr, $($arg:tt)+) => {};
    ($($arg:tt)+) => {};
}

#[cfg(not(feature = "log"))]
pub(crate) use {
    log_mock as debug, log_mock as error, log_mock as info, log_mock as trace, log_mock as warn,
};

/// Maps the `-d` verbosity scale to a level filter.
///
/// `0` off, `1`-`2` error, `3` warn, `4` info, `5` debug, `6` and above trace
#[cfg(feature = "log")]
#[must_use]
pub fn level_filter(debug_level: u8) -> ::log::LevelFilter {
    use ::log::LevelFilter;

    match debug_level {
        0 => LevelFilter::Off,
        1 | 2 => LevelFilter::Error,
        3 => LevelFilter::Warn,
        4 => LevelFilter::Info,
        5 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs `env_logger` at the verbosity of `debug_level`.
///
/// Filters in `RUST_LOG` take precedence.
///
/// # Errors
///
/// If a logger is installed already.
#[cfg(feature = "log")]
pub fn init_logger(debug_level: u8) -> Result<(), ::log::SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level_filter(debug_level))
        .parse_env(env_logger::Env::default())
        .try_init()
}

#[cfg(all(test, feature = "log"))]
mod tests {
    use ::log::LevelFilter;

    use super::level_filter;

    #[test]
    fn debug_level_scale() {
        assert_eq!(level_filter(0), LevelFilter::Off);
        assert_eq!(level_filter(1), LevelFilter::Error);
        assert_eq!(level_filter(2), LevelFilter::Error);
        assert_eq!(level_filter(3), LevelFilter::Warn);
        assert_eq!(level_filter(4), LevelFilter::Info);
        assert_eq!(level_filter(5), LevelFilter::Debug);
        assert_eq!(level_filter(6), LevelFilter::Trace);
        assert_eq!(level_filter(200), LevelFilter::Trace);
    }
}
