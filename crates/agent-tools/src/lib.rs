//! Tool management and dispatch
//!
//! Tools are plain handlers registered by name in an explicit
//! [`ToolRegistry`] at startup. The [`ToolDispatcher`] looks them up for each
//! invocation and always answers with text, so a conversational caller never
//! has to branch on errors.

pub mod definition;
pub mod dispatcher;
pub mod registry;
pub mod tool;

pub use definition::{ToolDefinition, schema};
pub use dispatcher::ToolDispatcher;
pub use registry::ToolRegistry;
pub use tool::Tool;
