//! Per-user session state
//!
//! Information Hiding:
//! - Where linkage tokens live (memory, disk) is hidden behind `SessionStore`
//! - The routing layer resolves a session id and passes a `SessionContext`;
//!   nothing here reads ambient request state

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod filesystem;
pub mod memory;

pub use filesystem::FileSystemSessionStore;
pub use memory::InMemorySessionStore;

/// The continuity token a session holds. A session never holds both kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "token", rename_all = "snake_case")]
pub enum LinkageToken {
    Conversation(String),
    PreviousResponse(String),
}

impl LinkageToken {
    pub fn value(&self) -> &str {
        match self {
            LinkageToken::Conversation(token) | LinkageToken::PreviousResponse(token) => token,
        }
    }
}

/// Session identity for one orchestration call.
/// A detached context means no session is active and calls run stateless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    id: Option<String>,
}

impl SessionContext {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into().trim().to_string();
        Self {
            id: (!id.is_empty()).then_some(id),
        }
    }

    pub fn detached() -> Self {
        Self { id: None }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// Storage for session linkage tokens
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Token held by the session, `None` if the session has none yet
    async fn load(&self, session_id: &str) -> Result<Option<LinkageToken>>;

    async fn save(&self, session_id: &str, token: &LinkageToken) -> Result<()>;

    /// Forget the session's token. Clearing an unknown session is not an error.
    async fn clear(&self, session_id: &str) -> Result<()>;
}
