//! Durable server-side conversation per session

use super::{ContinuityStrategy, ConversationStatus, Linkage, TokenSlot};
use crate::config::ContinuityMode;
use crate::core::remote::{InputItem, RemoteApi};
use crate::error::ChatResult;
use crate::session::{LinkageToken, SessionContext, SessionStore};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Creates a conversation object on first use and sends
/// `conversation: <id>` with every later turn.
pub struct DurableConversation {
    tokens: TokenSlot,
    developer_prompt: Option<String>,
}

impl DurableConversation {
    pub fn new(store: Arc<dyn SessionStore>, developer_prompt: Option<String>) -> Self {
        Self {
            tokens: TokenSlot::new(store),
            developer_prompt,
        }
    }

    async fn create(&self, api: &dyn RemoteApi) -> ChatResult<String> {
        let seed: Vec<InputItem> = self
            .developer_prompt
            .iter()
            .map(InputItem::developer)
            .collect();
        let id = api.create_conversation(&seed).await?;
        tracing::info!("[DurableConversation] Created conversation {}", id);
        Ok(id)
    }
}

#[async_trait]
impl ContinuityStrategy for DurableConversation {
    fn mode(&self) -> ContinuityMode {
        ContinuityMode::DurableConversation
    }

    async fn prepare_linkage(
        &self,
        session: &SessionContext,
        api: &dyn RemoteApi,
    ) -> ChatResult<Linkage> {
        let Some(session_id) = session.id() else {
            tracing::debug!("[DurableConversation] No active session, using a one-off conversation");
            return Ok(Linkage::Conversation(self.create(api).await?));
        };

        if let Some(LinkageToken::Conversation(id)) = self.tokens.load(session_id).await {
            return Ok(Linkage::Conversation(id));
        }

        let id = self.create(api).await?;
        self.tokens
            .save(session_id, LinkageToken::Conversation(id.clone()))
            .await;
        Ok(Linkage::Conversation(id))
    }

    async fn record_linkage(
        &self,
        _session: &SessionContext,
        _payload: &Value,
        _reply: &str,
    ) -> ChatResult<()> {
        Ok(())
    }

    async fn status(&self, session: &SessionContext) -> ChatResult<ConversationStatus> {
        let token = match session.id() {
            Some(id) => match self.tokens.load(id).await {
                Some(LinkageToken::Conversation(token)) => Some(token),
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
            tracing::info!("[DurableConversation] Cleared conversation for session '{}'", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stub::{Call, StubApi};
    use crate::session::InMemorySessionStore;

    fn strategy(prompt: Option<&str>) -> DurableConversation {
        DurableConversation::new(
            Arc::new(InMemorySessionStore::new()),
            prompt.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_creates_once_per_session() {
        let api = StubApi::new();
        let strategy = strategy(None);
        let session = SessionContext::new("s1");

        let first = strategy.prepare_linkage(&session, &api).await.unwrap();
        let second = strategy.prepare_linkage(&session, &api).await.unwrap();

        assert_eq!(first, Linkage::Conversation("conv_1".to_string()));
        assert_eq!(second, first);
        assert_eq!(api.count(Call::CreateConversation), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let api = StubApi::new();
        let strategy = strategy(None);

        let a = strategy
            .prepare_linkage(&SessionContext::new("a"), &api)
            .await
            .unwrap();
        let b = strategy
            .prepare_linkage(&SessionContext::new("b"), &api)
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_detached_session_creates_every_time() {
        let api = StubApi::new();
        let strategy = strategy(None);
        let session = SessionContext::detached();

        strategy.prepare_linkage(&session, &api).await.unwrap();
        strategy.prepare_linkage(&session, &api).await.unwrap();
        assert_eq!(api.count(Call::CreateConversation), 2);

        let status = strategy.status(&session).await.unwrap();
        assert!(!status.linked);
    }

    #[tokio::test]
    async fn test_developer_prompt_seeds_conversation() {
        let api = StubApi::new();
        let strategy = strategy(Some("be brief"));

        strategy
            .prepare_linkage(&SessionContext::new("s1"), &api)
            .await
            .unwrap();
        assert_eq!(api.conversation_seeds(), vec![vec![InputItem::developer("be brief")]]);
    }

    #[tokio::test]
    async fn test_status_and_reset() {
        let api = StubApi::new();
        let strategy = strategy(None);
        let session = SessionContext::new("s1");

        strategy.prepare_linkage(&session, &api).await.unwrap();
        let status = strategy.status(&session).await.unwrap();
        assert!(status.linked);
        assert_eq!(status.token.as_deref(), Some("conv_1"));

        strategy.reset(&session).await.unwrap();
        let status = strategy.status(&session).await.unwrap();
        assert!(!status.linked);
        assert_eq!(status.token, None);
    }
}
