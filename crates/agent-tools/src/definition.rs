//! Tool definitions handed to the agent framework

use crate::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Description of a registered tool as the agent framework sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (matches the name in the ToolRegistry)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Build the definition of a registered tool
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self::new(tool.name(), tool.description(), tool.input_schema())
    }

    /// Render as an OpenAI-style function declaration
    ///
    /// Most chat-agent frameworks (including DashScope's compatible mode)
    /// accept this shape for function calling.
    pub fn to_function_spec(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema,
            }
        })
    }
}

/// Helper module to build JSON schemas for tools
pub mod schema {
    use serde_json::{Value, json};

    /// Create a JSON schema for an object with properties
    ///
    /// # Example
    ///
    /// ```
    /// use agent_tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({
    ///         "sql_input": schema::string("SQL statement to run"),
    ///         "need_visualize": schema::boolean("Render statistics and a chart"),
    ///     }),
    ///     &["sql_input"],
    /// );
    /// assert_eq!(schema["required"][0], "sql_input");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// Integer property schema
    pub fn integer(description: &str) -> Value {
        json!({
            "type": "integer",
            "description": description,
        })
    }

    /// Boolean property schema
    pub fn boolean(description: &str) -> Value {
        json!({
            "type": "boolean",
            "description": description,
        })
    }

    /// Attach a default value to a property schema
    pub fn with_default(mut property: Value, default: Value) -> Value {
        if let Some(map) = property.as_object_mut() {
            map.insert("default".to_string(), default);
        }
        property
    }
}
