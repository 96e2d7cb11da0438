//! Conversation continuity
//!
//! Information Hiding:
//! - Which linkage field goes out with a turn, and where the returned token
//!   is kept, is decided by the active strategy alone
//! - The chat service only sees `ContinuityStrategy`; a deployment picks one
//!   variant at configuration time

use crate::config::ContinuityMode;
use crate::core::remote::{InputItem, RemoteApi, ResponseRequest};
use crate::error::{ChatError, ChatResult};
use crate::session::{LinkageToken, SessionContext, SessionStore};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

pub mod durable;
pub mod previous_response;
pub mod shared_history;

pub use durable::DurableConversation;
pub use previous_response::PreviousResponseChain;
pub use shared_history::{HistoryLog, SharedHistory};

/// Linkage fields for one outgoing turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Linkage {
    None,
    Conversation(String),
    PreviousResponse(String),
}

impl Linkage {
    pub fn apply(&self, request: &mut ResponseRequest) {
        match self {
            Linkage::None => {}
            Linkage::Conversation(id) => request.conversation = Some(id.clone()),
            Linkage::PreviousResponse(id) => request.previous_response_id = Some(id.clone()),
        }
    }
}

/// Outgoing `input` for a turn. May hold exclusive access to shared state
/// until the request carrying it has completed.
pub struct ComposedInput {
    input: Vec<InputItem>,
    permit: TurnPermit,
}

/// Exclusive access to shared state, released when dropped
pub struct TurnPermit {
    _guard: Option<OwnedMutexGuard<Vec<InputItem>>>,
}

impl ComposedInput {
    pub fn new(input: Vec<InputItem>) -> Self {
        Self {
            input,
            permit: TurnPermit { _guard: None },
        }
    }

    pub(crate) fn exclusive(guard: OwnedMutexGuard<Vec<InputItem>>) -> Self {
        let input = (*guard).clone();
        Self {
            input,
            permit: TurnPermit {
                _guard: Some(guard),
            },
        }
    }

    pub fn into_parts(self) -> (Vec<InputItem>, TurnPermit) {
        (self.input, self.permit)
    }
}

/// What `status` reports for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationStatus {
    pub strategy: ContinuityMode,
    pub linked: bool,
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_entries: Option<usize>,
}

#[async_trait]
pub trait ContinuityStrategy: Send + Sync {
    fn mode(&self) -> ContinuityMode;

    /// Linkage to send with the next turn. May create remote state.
    async fn prepare_linkage(
        &self,
        session: &SessionContext,
        api: &dyn RemoteApi,
    ) -> ChatResult<Linkage>;

    /// Build the `input` list around this turn
    async fn compose_input(&self, _linkage: &Linkage, turn: InputItem) -> ComposedInput {
        ComposedInput::new(vec![turn])
    }

    /// Persist whatever the response carries for the next turn
    async fn record_linkage(
        &self,
        session: &SessionContext,
        payload: &Value,
        reply: &str,
    ) -> ChatResult<()>;

    async fn status(&self, session: &SessionContext) -> ChatResult<ConversationStatus>;

    /// Drop session-held linkage. Remote objects are left alone.
    async fn reset(&self, session: &SessionContext) -> ChatResult<()>;
}

/// Build the strategy a deployment runs with
pub fn strategy_for(
    mode: ContinuityMode,
    store: Arc<dyn SessionStore>,
    developer_prompt: Option<String>,
) -> Arc<dyn ContinuityStrategy> {
    match mode {
        ContinuityMode::DurableConversation => {
            Arc::new(DurableConversation::new(store, developer_prompt))
        }
        ContinuityMode::PreviousResponse => {
            Arc::new(PreviousResponseChain::new(store, developer_prompt))
        }
        ContinuityMode::SharedHistory => {
            let instruction = developer_prompt
                .unwrap_or_else(|| crate::config::DEFAULT_DEVELOPER_PROMPT.to_string());
            Arc::new(SharedHistory::new(Arc::new(HistoryLog::new(instruction))))
        }
    }
}

/// Session-store access shared by the token-based strategies.
/// Read and write failures degrade to stateless behavior; clear failures
/// are reported.
pub(crate) struct TokenSlot {
    store: Arc<dyn SessionStore>,
}

impl TokenSlot {
    pub(crate) fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub(crate) async fn load(&self, session_id: &str) -> Option<LinkageToken> {
        match self.store.load(session_id).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(
                    "[Continuity] Failed to load session '{}', continuing without linkage: {:#}",
                    session_id,
                    e
                );
                None
            }
        }
    }

    pub(crate) async fn save(&self, session_id: &str, token: LinkageToken) {
        if let Err(e) = self.store.save(session_id, &token).await {
            tracing::warn!(
                "[Continuity] Failed to save linkage for session '{}': {:#}",
                session_id,
                e
            );
        }
    }

    pub(crate) async fn clear(&self, session_id: &str) -> ChatResult<()> {
        self.store
            .clear(session_id)
            .await
            .map_err(|e| ChatError::Session(format!("{:#}", e)))
    }
}
