//! Response chaining through `previous_response_id`

use super::{ComposedInput, ContinuityStrategy, ConversationStatus, Linkage, TokenSlot};
use crate::config::ContinuityMode;
use crate::core::extract::response_id;
use crate::core::remote::{InputItem, RemoteApi};
use crate::error::ChatResult;
use crate::session::{LinkageToken, SessionContext, SessionStore};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Stateless until the first successful response; afterwards each turn
/// points at the previous response id.
pub struct PreviousResponseChain {
    tokens: TokenSlot,
    developer_prompt: Option<String>,
}

impl PreviousResponseChain {
    pub fn new(store: Arc<dyn SessionStore>, developer_prompt: Option<String>) -> Self {
        Self {
            tokens: TokenSlot::new(store),
            developer_prompt,
        }
    }
}

#[async_trait]
impl ContinuityStrategy for PreviousResponseChain {
    fn mode(&self) -> ContinuityMode {
        ContinuityMode::PreviousResponse
    }

    async fn prepare_linkage(
        &self,
        session: &SessionContext,
        _api: &dyn RemoteApi,
    ) -> ChatResult<Linkage> {
        let Some(session_id) = session.id() else {
            return Ok(Linkage::None);
        };

        Ok(match self.tokens.load(session_id).await {
            Some(LinkageToken::PreviousResponse(id)) => Linkage::PreviousResponse(id),
            _ => Linkage::None,
        })
    }

    /// The developer instruction opens a chain and is inherited from then on
    async fn compose_input(&self, linkage: &Linkage, turn: InputItem) -> ComposedInput {
        match (linkage, &self.developer_prompt) {
            (Linkage::None, Some(prompt)) => {
                ComposedInput::new(vec![InputItem::developer(prompt.clone()), turn])
            }
            _ => ComposedInput::new(vec![turn]),
        }
    }

    async fn record_linkage(
        &self,
        session: &SessionContext,
        payload: &Value,
        _reply: &str,
    ) -> ChatResult<()> {
        let Some(session_id) = session.id() else {
            return Ok(());
        };

        match response_id(payload) {
            Some(id) => {
                self.tokens
                    .save(session_id, LinkageToken::PreviousResponse(id.to_string()))
                    .await;
                tracing::debug!(
                    "[PreviousResponseChain] Session '{}' now chained to {}",
                    session_id,
                    id
                );
            }
            None => tracing::warn!(
                "[PreviousResponseChain] Response carried no id; session '{}' keeps its previous link",
                session_id
            ),
        }
        Ok(())
    }

    async fn status(&self, session: &SessionContext) -> ChatResult<ConversationStatus> {
        let token = match session.id() {
            Some(id) => match self.tokens.load(id).await {
                Some(LinkageToken::PreviousResponse(token)) => Some(token),
                _ => None,
            },
            None => None,
        };

        Ok(ConversationStatus {
            strategy: self.mode(),
            linked: token.is_some(),
            token,
            history_entries: None,
        })
    }

    async fn reset(&self, session: &SessionContext) -> ChatResult<()> {
        if let Some(id) = session.id() {
            self.tokens.clear(id).await?;
            tracing::info!("[PreviousResponseChain] Cleared chain for session '{}'", id);
        }
        Ok(())
    }
}
