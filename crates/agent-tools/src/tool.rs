//! Tool trait definition

use agent_core::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that agents can execute
///
/// Each tool provides a name, a description and a JSON schema for its input.
/// The output is a single text blob that the calling agent surfaces to the
/// user verbatim; embedded images use markdown image syntax.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// # Arguments
    ///
    /// * `params` - Tool input as JSON value (should match input_schema)
    /// * `context` - State of the conversation the call is made for
    ///
    /// Domain failures are expected to be reported inside the returned text.
    /// `Err` is reserved for calls the tool could not even interpret, such as
    /// arguments that do not match the schema.
    async fn execute(&self, params: Value, context: &mut Context) -> Result<String>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {
    ///         "ts_code": { "type": "string" },
    ///         "n": { "type": "integer" }
    ///     },
    ///     "required": ["ts_code", "n"]
    /// });
    /// ```
    fn input_schema(&self) -> Value;
}
