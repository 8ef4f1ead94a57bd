//! The stock query assistant as seen by a chat agent

use crate::config::AssistantConfig;
use crate::error::Result;
use crate::prompts;
use crate::session::SessionStore;
use crate::source::{DataSource, MySqlSource};
use crate::table::Table;
use crate::tools;
use agent_tools::{ToolDefinition, ToolDispatcher};
use chrono::Local;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Tool dispatch plus per-session state
///
/// One assistant serves any number of conversations; callers identify a
/// conversation by an explicit session id.
#[derive(Clone)]
pub struct StockAssistant {
    config: Arc<AssistantConfig>,
    dispatcher: ToolDispatcher,
    sessions: SessionStore,
}

impl StockAssistant {
    /// Build an assistant over an existing data source
    pub fn new(config: AssistantConfig, source: Arc<dyn DataSource>) -> Result<Self> {
        config.validate()?;
        let registry = tools::registry(&config, source);
        info!(
            tools = registry.len(),
            database = %config.default_database,
            output_dir = %config.output_dir.display(),
            "Stock assistant ready"
        );

        Ok(Self {
            sessions: SessionStore::from_config(&config),
            dispatcher: ToolDispatcher::new(Arc::new(registry)),
            config: Arc::new(config),
        })
    }

    /// Build an assistant backed by MySQL
    pub fn connect(config: AssistantConfig) -> Result<Self> {
        let source = MySqlSource::new(&config)?;
        Self::new(config, Arc::new(source))
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Invoke `tool` with `arguments` within `session_id` and return its text
    pub async fn call(&self, session_id: &str, tool: &str, arguments: Value) -> String {
        let handle = self.sessions.session(session_id).await;
        let mut context = handle.lock().await;
        self.dispatcher.dispatch(tool, arguments, &mut context).await
    }

    /// Forget everything stored for `session_id`
    pub async fn end_session(&self, session_id: &str) -> bool {
        self.sessions.end(session_id).await
    }

    /// Latest SQL result of `session_id`, if any
    pub async fn last_result(&self, session_id: &str) -> Option<Table> {
        self.sessions.last_result(session_id).await
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.dispatcher.definitions()
    }

    /// System prompt describing the schema, the tools and output rules
    pub fn system_prompt(&self) -> Result<String> {
        prompts::system_prompt(
            &self.config.default_database,
            &self.config.price_table,
            &self.tool_definitions(),
            Local::now().date_naive(),
        )
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}
