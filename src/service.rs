//! Chat orchestration façade
//!
//! Information Hiding:
//! - Composes the remote API, the continuity strategy and the attachment
//!   flows; callers see one operation per use case
//! - Adds no retries or caching of its own

use crate::attachments::FileAttachments;
use crate::config::{ContinuityMode, Settings};
use crate::continuity::{strategy_for, ContinuityStrategy, ConversationStatus, Linkage};
use crate::core::extract::extract_output_text;
use crate::core::openai::OpenAIClient;
use crate::core::remote::{FileUpload, IndexEntry, InputItem, RemoteApi, ResponseRequest, UploadedFile};
use crate::error::{ChatError, ChatResult};
use crate::session::{SessionContext, SessionStore};
use std::sync::Arc;

pub struct ChatService {
    api: Arc<dyn RemoteApi>,
    strategy: Arc<dyn ContinuityStrategy>,
    attachments: FileAttachments,
    model: String,
}

impl ChatService {
    pub fn new(
        api: Arc<dyn RemoteApi>,
        strategy: Arc<dyn ContinuityStrategy>,
        model: impl Into<String>,
        index_id: Option<String>,
    ) -> Self {
        let attachments = FileAttachments::new(api.clone(), index_id);
        Self {
            api,
            strategy,
            attachments,
            model: model.into(),
        }
    }

    /// Wire the service from configuration. Fails when no API key is available.
    pub fn from_settings(settings: &Settings, store: Arc<dyn SessionStore>) -> ChatResult<Self> {
        let api_key = settings.api_key()?;
        let api: Arc<dyn RemoteApi> = Arc::new(OpenAIClient::new(&api_key, settings.base_url())?);
        let strategy = strategy_for(
            settings.chat.continuity,
            store,
            settings.developer_prompt(),
        );

        if strategy.mode() == ContinuityMode::SharedHistory {
            tracing::warn!(
                "[ChatService] shared_history continuity keeps one transcript for all callers; \
                 use it for single-tenant deployments only"
            );
        }

        tracing::info!(
            "[ChatService] Ready: model={}, continuity={}, vector_store={}",
            settings.model(),
            strategy.mode().as_str(),
            settings.vector_store_id().as_deref().unwrap_or("<none>")
        );

        Ok(Self::new(
            api,
            strategy,
            settings.model(),
            settings.vector_store_id(),
        ))
    }

    pub fn mode(&self) -> ContinuityMode {
        self.strategy.mode()
    }

    pub async fn chat(&self, session: &SessionContext, prompt: &str) -> ChatResult<String> {
        validate_prompt(prompt)?;

        let linkage = self.strategy.prepare_linkage(session, self.api.as_ref()).await?;
        self.run_turn(session, linkage, InputItem::user_text(prompt))
            .await
    }

    /// One turn carrying `file` as direct input. The file is not indexed.
    pub async fn chat_with_file(
        &self,
        session: &SessionContext,
        prompt: &str,
        file: &FileUpload,
    ) -> ChatResult<String> {
        validate_prompt(prompt)?;
        FileAttachments::validate_upload(file)?;

        let linkage = self.strategy.prepare_linkage(session, self.api.as_ref()).await?;
        let uploaded = self.attachments.upload_for_turn(file).await?;

        self.run_turn(
            session,
            linkage,
            InputItem::user_text_with_file(prompt, uploaded.file_id),
        )
        .await
    }

    /// Forget the session's linkage. Remote conversations are not deleted.
    pub async fn reset_conversation(&self, session: &SessionContext) -> ChatResult<()> {
        self.strategy.reset(session).await
    }

    pub async fn status(&self, session: &SessionContext) -> ChatResult<ConversationStatus> {
        self.strategy.status(session).await
    }

    pub async fn list_index_files(&self) -> ChatResult<Vec<IndexEntry>> {
        self.attachments.list_index().await
    }

    pub async fn add_index_file(&self, file: &FileUpload) -> ChatResult<UploadedFile> {
        self.attachments.add_to_index(file).await
    }

    pub async fn remove_index_file(&self, file_id: &str) -> ChatResult<()> {
        self.attachments.remove_from_index(file_id).await
    }

    /// Retry the attach step for a file left unindexed by `add_index_file`
    pub async fn attach_index_file(&self, file_id: &str) -> ChatResult<()> {
        self.attachments.attach(file_id).await
    }

    async fn run_turn(
        &self,
        session: &SessionContext,
        linkage: Linkage,
        turn: InputItem,
    ) -> ChatResult<String> {
        let (input, permit) = self
            .strategy
            .compose_input(&linkage, turn)
            .await
            .into_parts();

        let mut request = ResponseRequest::new(self.model.clone(), input)
            .with_file_search(self.attachments.index_id());
        linkage.apply(&mut request);

        tracing::debug!(
            "[ChatService] Sending turn ({} input items, linkage {:?})",
            request.input.len(),
            linkage
        );
        let outcome = self.api.create_response(&request).await;
        drop(permit);

        let payload = outcome?;
        let reply = extract_output_text(&payload);
        self.strategy
            .record_linkage(session, &payload, &reply)
            .await?;
        Ok(reply)
    }
}

fn validate_prompt(prompt: &str) -> ChatResult<()> {
    if prompt.trim().is_empty() {
        return Err(ChatError::validation("prompt must not be blank"));
    }
    Ok(())
}
