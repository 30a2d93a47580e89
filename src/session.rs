use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Data attached to a browsing session. The cart itself is persisted and
/// keyed by the session id; this record carries the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Session storage seam. Injected into `AppState` so handlers never reach
/// for a global.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Option<SessionData>;
    async fn store(&self, session_id: &str, data: SessionData);
    async fn destroy(&self, session_id: &str);
}

/// In-memory session store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionData>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Option<SessionData> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    async fn store(&self, session_id: &str, data: SessionData) {
        self.sessions.insert(session_id.to_string(), data);
    }

    async fn destroy(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}

/// Issues a fresh opaque session id.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
