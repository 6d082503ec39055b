//! Conditional trace logging gated on a module-level `ENABLE_LOGS` flag.
//!
//! Usage:
//! ```rust
//! // The macro is exported at the crate root:
//! use tubeguard::log_debug;
//!
//! // In your module, define the flag first:
//! const ENABLE_LOGS: bool = true;
//!
//! log_debug!("This will log if ENABLE_LOGS is true");
//! ```
//!
//! Only per-event tracing is gated; warnings and errors always go
//! straight through `log::warn!` / `log::error!`.

/// Macro for conditional debug logging.
/// Checks the `ENABLE_LOGS` const in the calling module.
///
/// Each module that uses this macro must define:
/// ```rust
/// const ENABLE_LOGS: bool = true; // or false
/// ```
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}
