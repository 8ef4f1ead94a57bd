//! Per-conversation context for tool invocations
//!
//! A `Context` is owned by one conversation session and handed to every tool
//! call made on behalf of that conversation. Tools use it to keep
//! conversation-scoped state (for example the last query result) without any
//! process-wide mutable maps.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Session ID the context belongs to
    pub const SESSION_ID: &str = "session_id";
    /// Number of tool invocations made with this context
    pub const INVOCATIONS: &str = "invocations";
}

/// Context passed to tools during execution
///
/// # Example
///
/// ```
/// use agent_core::Context;
///
/// let ctx = Context::for_session("sess-42");
///
/// assert_eq!(ctx.session_id(), Some("sess-42"));
/// assert_eq!(ctx.invocations(), 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context bound to a session
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self::new().with_session_id(session_id)
    }

    /// Set the session ID
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.insert(keys::SESSION_ID, serde_json::json!(session_id.into()));
        self
    }

    /// Get the session ID
    pub fn session_id(&self) -> Option<&str> {
        self.get(keys::SESSION_ID).and_then(|v| v.as_str())
    }

    /// Number of tool invocations recorded on this context
    pub fn invocations(&self) -> u64 {
        self.get(keys::INVOCATIONS)
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0)
    }

    /// Record one more tool invocation and return the new count
    pub fn record_invocation(&mut self) -> u64 {
        let next = self.invocations() + 1;
        self.insert(keys::INVOCATIONS, serde_json::json!(next));
        next
    }

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Insert a typed value into the context
    ///
    /// Serializes the value to JSON before storing.
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::ProcessingFailed(format!("Failed to serialize context value: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value from the context
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::ProcessingFailed(format!(
                        "Failed to deserialize context value: {e}"
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value from the context
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Snapshot {
        rows: usize,
        columns: Vec<String>,
    }

    #[test]
    fn test_session_binding() {
        let ctx = Context::for_session("sess-1");
        assert_eq!(ctx.session_id(), Some("sess-1"));
        assert_eq!(ctx.invocations(), 0);
    }

    #[test]
    fn test_typed_roundtrip_through_context() {
        let mut ctx = Context::new();
        let snapshot = Snapshot {
            rows: 3,
            columns: vec!["trade_date".to_string(), "close".to_string()],
        };

        ctx.insert_typed("last_result", &snapshot).unwrap();

        let stored: Snapshot = ctx.get_typed("last_result").unwrap().unwrap();
        assert_eq!(stored, snapshot);
    }

    #[test]
    fn test_get_typed_wrong_shape_is_error() {
        let mut ctx = Context::new();
        ctx.insert("last_result", serde_json::json!("not a snapshot"));

        let result: crate::Result<Option<Snapshot>> = ctx.get_typed("last_result");
        assert!(result.is_err());
    }

    #[test]
    fn test_get_typed_missing_key() {
        let ctx = Context::new();
        let result: crate::Result<Option<Snapshot>> = ctx.get_typed("missing");
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_invocation_counter() {
        let mut ctx = Context::for_session("sess-2");
        assert_eq!(ctx.invocations(), 0);
        assert_eq!(ctx.record_invocation(), 1);
        assert_eq!(ctx.record_invocation(), 2);
        assert_eq!(ctx.invocations(), 2);
    }

    #[test]
    fn test_remove() {
        let mut ctx = Context::new();
        ctx.insert("key", serde_json::json!(1));
        assert!(ctx.contains_key("key"));
        assert_eq!(ctx.len(), 1);

        ctx.remove("key");
        assert!(ctx.is_empty());
    }
}
