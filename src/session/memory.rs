//! In-Memory Session Store
//!
//! Tokens are lost when the process exits; suitable for servers whose
//! sessions share the process lifetime, and for tests.

use super::{LinkageToken, SessionStore};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, LinkageToken>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<LinkageToken>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, token: &LinkageToken) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.to_string(), token.clone());
        tracing::debug!("[InMemorySessionStore] Saved token for session '{}'", session_id);
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        tracing::debug!("[InMemorySessionStore] Cleared session '{}'", session_id);
        Ok(())
    }
}
