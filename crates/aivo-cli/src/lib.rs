//! AIVO CLI - Command-line front-ends
//!
//! Shared pieces of the `aivo` chat binary and the `aivo-admin`
//! collection management binary.

pub mod logging;
pub mod manage;
pub mod repl;

pub use logging::LogGuard;
