//! Shared utilities
//!
//! Logging setup and helpers for reading configuration from the environment.

pub mod env;
pub mod logging;

pub use env::{EnvError, parse_var};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
