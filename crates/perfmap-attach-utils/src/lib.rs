//! # perfmap-attach utilities
//!
//! Shared helpers for the perfmap-attach workspace.
//!
//! Right now this is the logging setup, built on `tracing`. The CLI logs
//! through the re-exported macros.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with_level, log_format_from_env, LogFormat, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
