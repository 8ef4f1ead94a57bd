//! Tools exposed to the chat agent

pub mod forecast;
pub mod sql;

pub use forecast::ArimaStockTool;
pub use sql::ExcSqlTool;

use crate::artifact::ArtifactStore;
use crate::config::AssistantConfig;
use crate::source::DataSource;
use agent_tools::ToolRegistry;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Registry holding every stock query tool
pub fn registry(config: &AssistantConfig, source: Arc<dyn DataSource>) -> ToolRegistry {
    let artifacts = ArtifactStore::from_config(config);
    ToolRegistry::new()
        .with_tool(Arc::new(ExcSqlTool::new(
            Arc::clone(&source),
            artifacts.clone(),
            config.default_database.clone(),
        )))
        .with_tool(Arc::new(ArimaStockTool::new(source, artifacts, config)))
}

/// Deserialize tool arguments
///
/// Agent frameworks hand arguments over either as a JSON object or as a
/// string holding one; both are accepted.
pub(crate) fn parse_params<T: DeserializeOwned>(params: Value) -> agent_core::Result<T> {
    let params = match params {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| agent_core::Error::InvalidParameters(e.to_string()))?,
        other => other,
    };
    serde_json::from_value(params).map_err(|e| agent_core::Error::InvalidParameters(e.to_string()))
}
