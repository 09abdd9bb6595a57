//! Logging macros backed by `log` or `tracing`
//!
//! The backend is picked at compile time:
//!
//! - `log` (default) forwards to the `log` crate
//! - `tracing` forwards to `tracing` events
//!
//! With neither feature enabled the macros expand to nothing.
//!
//! Levels used by the router:
//!
//! | level | events |
//! |-------|--------|
//! | trace | pattern compilation, every match attempt |
//! | debug | router construction, resolve start, no route matched |
//! | info  | a failure handed to the error handler |
//! | warn  | a candidate path that cannot be parsed |
//!
//! ```ignore
//! use tree_navigator::{debug_log, trace_log};
//!
//! trace_log!("'{}' does not match '{}'", path, pattern);
//! debug_log!("No route matches '{}'", path);
//! ```

/// Trace-level event
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Debug-level event
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}

/// Info-level event
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
    };
}

/// Warn-level event
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    };
}

/// Error-level event
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
    };
}
