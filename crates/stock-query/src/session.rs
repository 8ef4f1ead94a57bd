//! Per-conversation state

use crate::config::AssistantConfig;
use crate::table::Table;
use agent_core::Context;
use cached::{Cached, TimedSizedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Context key holding the most recent SQL result of a session
pub const LAST_RESULT: &str = "last_result";

/// Shared handle to one session's context
pub type SessionHandle = Arc<Mutex<Context>>;

/// Sessions keyed by an explicit id
///
/// Idle sessions expire after the TTL (refreshed on every use) and the least
/// recently used ones are evicted beyond the capacity. Each session's context
/// sits behind its own lock, so calls within one session run one at a time
/// while different sessions proceed independently.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<TimedSizedCache<String, SessionHandle>>>,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(
                TimedSizedCache::with_size_and_lifespan_and_refresh(capacity, ttl, true),
            )),
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(config.session_ttl, config.session_capacity)
    }

    /// Handle for `session_id`, creating a fresh context on first use
    pub async fn session(&self, session_id: &str) -> SessionHandle {
        let mut sessions = self.sessions.lock().await;
        Arc::clone(sessions.cache_get_or_set_with(session_id.to_string(), || {
            debug!(session_id, "Starting session");
            Arc::new(Mutex::new(Context::for_session(session_id)))
        }))
    }

    /// Handle for `session_id` if it is still live
    pub async fn existing(&self, session_id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.lock().await;
        sessions.cache_get(&session_id.to_string()).cloned()
    }

    /// Drop a session; returns whether it existed
    pub async fn end(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        let ended = sessions.cache_remove(&session_id.to_string()).is_some();
        debug!(session_id, ended, "Ending session");
        ended
    }

    /// Most recent SQL result stored by `session_id`
    pub async fn last_result(&self, session_id: &str) -> Option<Table> {
        let handle = self.existing(session_id).await?;
        let context = handle.lock().await;
        match context.get_typed::<Table>(LAST_RESULT) {
            Ok(table) => table,
            Err(e) => {
                warn!(session_id, error = %e, "Stored result is unreadable");
                None
            }
        }
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        sessions.flush();
        sessions.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
