//! CLI module - command-line interface
//!
//! Contains the REPL and logging setup for the binary.

pub mod logging;
pub mod repl;

pub use logging::{init_logging, TelemetryGuard};
pub use repl::Repl;
