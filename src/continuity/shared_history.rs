//! Process-wide transcript resent in full on every turn
//!
//! The log is shared by every caller of the service that owns it, so one
//! user's turns are visible to all others. Only suitable for single-tenant
//! deployments; sessions play no part in this strategy.

use super::{ComposedInput, ContinuityStrategy, ConversationStatus, Linkage};
use crate::config::ContinuityMode;
use crate::core::extract::NO_TEXT_OUTPUT;
use crate::core::remote::{InputItem, RemoteApi};
use crate::error::ChatResult;
use crate::session::SessionContext;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Append-only transcript whose first entry is the instruction
pub struct HistoryLog {
    entries: Arc<Mutex<Vec<InputItem>>>,
}

impl HistoryLog {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(vec![InputItem::developer(instruction)])),
        }
    }

    pub async fn snapshot(&self) -> Vec<InputItem> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Append `turn` and keep the log locked until the returned input is dropped
    async fn append_exclusive(&self, turn: InputItem) -> ComposedInput {
        let mut guard = self.entries.clone().lock_owned().await;
        guard.push(turn);
        ComposedInput::exclusive(guard)
    }

    async fn append(&self, turn: InputItem) {
        self.entries.lock().await.push(turn);
    }
}

pub struct SharedHistory {
    log: Arc<HistoryLog>,
}

impl SharedHistory {
    pub fn new(log: Arc<HistoryLog>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl ContinuityStrategy for SharedHistory {
    fn mode(&self) -> ContinuityMode {
        ContinuityMode::SharedHistory
    }

    async fn prepare_linkage(
        &self,
        _session: &SessionContext,
        _api: &dyn RemoteApi,
    ) -> ChatResult<Linkage> {
        Ok(Linkage::None)
    }

    async fn compose_input(&self, _linkage: &Linkage, turn: InputItem) -> ComposedInput {
        self.log.append_exclusive(turn).await
    }

    async fn record_linkage(
        &self,
        _session: &SessionContext,
        _payload: &Value,
        reply: &str,
    ) -> ChatResult<()> {
        // the log only holds text the model produced
        if reply == NO_TEXT_OUTPUT {
            tracing::debug!("[SharedHistory] Response had no text output; nothing appended");
            return Ok(());
        }
        self.log.append(InputItem::assistant(reply)).await;
        Ok(())
    }

    async fn status(&self, _session: &SessionContext) -> ChatResult<ConversationStatus> {
        Ok(ConversationStatus {
            strategy: self.mode(),
            linked: false,
            token: None,
            history_entries: Some(self.log.len().await),
        })
    }

    async fn reset(&self, _session: &SessionContext) -> ChatResult<()> {
        tracing::info!("[SharedHistory] Reset requested; the shared transcript is not session-held and is kept");
        Ok(())
    }
}
