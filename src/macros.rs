//! Logging shims that compile away unless `verbose-logging` is enabled.

macro_rules! debug_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "verbose-logging")]
        log::debug!($($arg)*);
    }};
}

macro_rules! warn_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "verbose-logging")]
        log::warn!($($arg)*);
    }};
}
