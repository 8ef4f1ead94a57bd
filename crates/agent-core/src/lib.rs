//! Core abstractions shared by the tool crates
//!
//! This crate defines the per-conversation [`Context`] handed to every tool
//! invocation and the error type tools report through.

pub mod context;
pub mod error;

pub use context::Context;
pub use error::{Error, Result};
