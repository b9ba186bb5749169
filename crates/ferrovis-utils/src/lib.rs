//! # Ferrovis Utilities
//!
//! Shared utilities and logging for Ferrovis.
//!
//! Logging is built on `tracing`; the formatter engine only emits events and
//! leaves subscriber setup to the binary embedding it.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard};
pub use tracing::{debug, error, info, trace, warn};
