//! Tool dispatch for agent frameworks
//!
//! The dispatcher is the boundary between an agent framework and the
//! registered tools: it resolves the tool by name, runs it against the
//! caller's context and turns every outcome into text.

use crate::{ToolDefinition, ToolRegistry};
use agent_core::Context;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Dispatches tool calls by name
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    /// Create a dispatcher over a registry
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Registry backing this dispatcher
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Definitions of every dispatchable tool
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Invoke a tool and return its text output
    ///
    /// Unknown tools and rejected arguments are reported as text as well.
    pub async fn dispatch(&self, name: &str, input: Value, context: &mut Context) -> String {
        let input_preview: String = input.to_string().chars().take(500).collect();
        let invocation = context.record_invocation();
        info!(
            tool_name = %name,
            session_id = context.session_id().unwrap_or("-"),
            invocation,
            input_preview = %input_preview,
            "Executing tool"
        );

        let Some(tool) = self.registry.get(name) else {
            warn!(tool_name = %name, "Tool not found");
            return agent_core::Error::ToolNotFound(name.to_string()).to_string();
        };

        let start_time = Instant::now();
        let outcome = tool.execute(input, context).await;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                let output_preview: String = output.chars().take(300).collect();
                info!(
                    tool_name = %name,
                    duration_ms,
                    output_length = output.len(),
                    "Tool execution succeeded"
                );
                debug!(output_preview = %output_preview, "Tool output preview");
                output
            }
            Err(e) => {
                warn!(tool_name = %name, duration_ms, error = %e, "Tool execution failed");
                e.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tool;
    use agent_core::Result;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        async fn execute(&self, params: Value, _context: &mut Context) -> Result<String> {
            let text = params["text"].as_str().ok_or_else(|| {
                agent_core::Error::InvalidParameters("missing field `text`".to_string())
            })?;
            Ok(text.to_string())
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the text argument"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }
    }

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(Arc::new(ToolRegistry::new().with_tool(Arc::new(Echo))))
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let mut ctx = Context::for_session("s1");
        let output = dispatcher()
            .dispatch("echo", json!({"text": "hello"}), &mut ctx)
            .await;
        assert_eq!(output, "hello");
        assert_eq!(ctx.invocations(), 1);
    }

    #[test]
    fn test_unknown_tool_is_text() {
        let mut ctx = Context::new();
        let output = tokio_test::block_on(dispatcher().dispatch("nope", json!({}), &mut ctx));
        assert_eq!(output, "Tool not found: nope");
    }

    #[tokio::test]
    async fn test_invalid_parameters_is_text() {
        let mut ctx = Context::new();
        let output = dispatcher().dispatch("echo", json!({}), &mut ctx).await;
        assert!(output.starts_with("Invalid parameters"));
    }

    #[test]
    fn test_definitions() {
        let defs = dispatcher().definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }
}
