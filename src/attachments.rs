//! File attachment flows
//!
//! Information Hiding:
//! - Upload → attach sequencing and partial-failure classification
//! - Index listing joins membership with per-file metadata on every call;
//!   nothing about the index is cached here

use crate::core::remote::{FilePurpose, FileUpload, IndexEntry, RemoteApi, UploadedFile};
use crate::error::{ChatError, ChatResult};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Metadata lookups in flight at once while listing the index
const METADATA_CONCURRENCY: usize = 8;

pub struct FileAttachments {
    api: Arc<dyn RemoteApi>,
    index_id: Option<String>,
}

impl FileAttachments {
    pub fn new(api: Arc<dyn RemoteApi>, index_id: Option<String>) -> Self {
        let index_id = index_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        Self { api, index_id }
    }

    /// Configured vector store, if any
    pub fn index_id(&self) -> Option<&str> {
        self.index_id.as_deref()
    }

    fn require_index(&self) -> ChatResult<&str> {
        self.index_id().ok_or_else(ChatError::missing_index)
    }

    pub(crate) fn validate_upload(file: &FileUpload) -> ChatResult<()> {
        if file.is_empty() {
            return Err(ChatError::validation("file must not be empty"));
        }
        Ok(())
    }

    fn validate_file_id(file_id: &str) -> ChatResult<&str> {
        let file_id = file_id.trim();
        if file_id.is_empty() {
            return Err(ChatError::validation("file id must not be blank"));
        }
        if file_id.contains(['/', '\\', '?', '#', '%']) || file_id.contains("..") {
            return Err(ChatError::validation(format!(
                "file id '{}' contains reserved characters",
                file_id
            )));
        }
        Ok(file_id)
    }

    /// Upload a file for direct inclusion in a single turn
    pub async fn upload_for_turn(&self, file: &FileUpload) -> ChatResult<UploadedFile> {
        Self::validate_upload(file)?;
        let uploaded = self.api.upload_file(file, FilePurpose::UserData).await?;
        tracing::debug!(
            "[FileAttachments] Uploaded {} as {} for a single turn",
            uploaded.filename,
            uploaded.file_id
        );
        Ok(uploaded)
    }

    /// Upload then attach to the index. An attach failure after a successful
    /// upload is reported as `PartialFailure` naming the uploaded file.
    pub async fn add_to_index(&self, file: &FileUpload) -> ChatResult<UploadedFile> {
        Self::validate_upload(file)?;
        let index_id = self.require_index()?;

        let uploaded = self.api.upload_file(file, FilePurpose::Assistants).await?;

        if let Err(e) = self.api.attach_to_index(index_id, &uploaded.file_id).await {
            tracing::warn!(
                "[FileAttachments] File {} uploaded but attach to {} failed: {}",
                uploaded.file_id,
                index_id,
                e
            );
            return Err(ChatError::PartialFailure {
                file_id: uploaded.file_id,
                source: Box::new(e),
            });
        }

        tracing::info!(
            "[FileAttachments] Added {} ({}) to index {}",
            uploaded.filename,
            uploaded.file_id,
            index_id
        );
        Ok(uploaded)
    }

    /// Attach an already uploaded file; the retry path after a partial failure
    pub async fn attach(&self, file_id: &str) -> ChatResult<()> {
        let file_id = Self::validate_file_id(file_id)?;
        let index_id = self.require_index()?;

        self.api.attach_to_index(index_id, file_id).await?;
        tracing::info!("[FileAttachments] Attached {} to index {}", file_id, index_id);
        Ok(())
    }

    pub async fn remove_from_index(&self, file_id: &str) -> ChatResult<()> {
        let file_id = Self::validate_file_id(file_id)?;
        let index_id = self.require_index()?;

        self.api.detach_from_index(index_id, file_id).await?;
        tracing::info!("[FileAttachments] Removed {} from index {}", file_id, index_id);
        Ok(())
    }

    /// Members whose metadata lookup fails are logged and left out
    pub async fn list_index(&self) -> ChatResult<Vec<IndexEntry>> {
        let index_id = self.require_index()?;
        let members = self.api.list_index_members(index_id).await?;

        let lookups: Vec<_> = stream::iter(members.iter())
            .map(|file_id| async move { (file_id, self.api.file_metadata(file_id).await) })
            .buffered(METADATA_CONCURRENCY)
            .collect()
            .await;

        let entries: Vec<IndexEntry> = lookups
            .into_iter()
            .filter_map(|(file_id, metadata)| match metadata {
                Ok(filename) => Some(IndexEntry {
                    file_id: file_id.clone(),
                    filename,
                }),
                Err(e) => {
                    tracing::warn!(
                        "[FileAttachments] Skipping index member {}: metadata lookup failed: {}",
                        file_id,
                        e
                    );
                    None
                }
            })
            .collect();

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stub::{Call, StubApi};
    use crate::error::ErrorKind;

    fn attachments(api: StubApi, index: Option<&str>) -> (Arc<StubApi>, FileAttachments) {
        let api = Arc::new(api);
        let attachments = FileAttachments::new(api.clone(), index.map(str::to_string));
        (api, attachments)
    }

    fn pdf() -> FileUpload {
        FileUpload::new(b"%PDF-1.7".to_vec(), Some("manual.pdf".to_string()))
    }

    #[tokio::test]
    async fn test_add_uploads_then_attaches() {
        let (api, attachments) = attachments(StubApi::new(), Some("vs_1"));

        let uploaded = attachments.add_to_index(&pdf()).await.unwrap();
        assert_eq!(uploaded.file_id, "file_1");
        assert_eq!(api.calls(), vec![Call::UploadFile, Call::AttachToIndex]);
        assert_eq!(api.uploads(), vec![("manual.pdf".to_string(), FilePurpose::Assistants)]);
    }

    #[tokio::test]
    async fn test_attach_failure_names_uploaded_file() {
        let stub = StubApi {
            fail_attach: true,
            ..StubApi::new()
        };
        let (_, attachments) = attachments(stub, Some("vs_1"));

        let err = attachments.add_to_index(&pdf()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PartialFailure);
        assert_eq!(err.orphaned_file_id(), Some("file_1"));
        assert!(err.to_string().contains("file_1"));
    }

    #[tokio::test]
    async fn test_upload_failure_skips_attach() {
        let stub = StubApi {
            fail_upload: true,
            ..StubApi::new()
        };
        let (api, attachments) = attachments(stub, Some("vs_1"));

        let err = attachments.add_to_index(&pdf()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(api.count(Call::AttachToIndex), 0);
    }

    #[tokio::test]
    async fn test_empty_file_rejected_before_network() {
        let (api, attachments) = attachments(StubApi::new(), Some("vs_1"));
        let empty = FileUpload::new(Vec::new(), Some("empty.txt".to_string()));

        let err = attachments.add_to_index(&empty).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = attachments.upload_for_turn(&empty).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_index_fails_fast() {
        let (api, attachments) = attachments(StubApi::new(), Some("   "));
        assert_eq!(attachments.index_id(), None);

        let errors = vec![
            attachments.add_to_index(&pdf()).await.unwrap_err(),
            attachments.list_index().await.unwrap_err(),
            attachments.remove_from_index("file_1").await.unwrap_err(),
            attachments.attach("file_1").await.unwrap_err(),
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_listing_skips_failed_metadata() {
        let stub = StubApi {
            index_members: vec!["f1".to_string(), "f2".to_string(), "f3".to_string()],
            failing_metadata: ["f2".to_string()].into_iter().collect(),
            ..StubApi::new()
        };
        let (api, attachments) = attachments(stub, Some("vs_1"));

        let entries = attachments.list_index().await.unwrap();
        assert_eq!(
            entries,
            vec![
                IndexEntry {
                    file_id: "f1".to_string(),
                    filename: "f1.txt".to_string(),
                },
                IndexEntry {
                    file_id: "f3".to_string(),
                    filename: "f3.txt".to_string(),
                },
            ]
        );
        assert_eq!(api.count(Call::ListIndexMembers), 1);
        assert_eq!(api.count(Call::FileMetadata), 3);
    }

    #[tokio::test]
    async fn test_remove_propagates_failure() {
        let stub = StubApi {
            fail_detach: true,
            ..StubApi::new()
        };
        let (api, attachments) = attachments(stub, Some("vs_1"));

        let err = attachments.remove_from_index("file_9").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(api.count(Call::DetachFromIndex), 1);

        let err = attachments.remove_from_index("  ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_reserved_file_ids_rejected_before_network() {
        let (api, attachments) = attachments(StubApi::new(), Some("vs_1"));

        for file_id in ["x/../../../../files/file-victim", "..", "file-1?purge=true", "file#1", "file%2F1"] {
            let err = attachments.remove_from_index(file_id).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{}", file_id);
            let err = attachments.attach(file_id).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{}", file_id);
        }
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_listing_keeps_member_order_past_concurrency_limit() {
        let members: Vec<String> = (0..METADATA_CONCURRENCY * 3)
            .map(|n| format!("file-{:02}", n))
            .collect();
        let stub = StubApi {
            index_members: members.clone(),
            ..StubApi::new()
        };
        let (api, attachments) = attachments(stub, Some("vs_1"));

        let entries = attachments.list_index().await.unwrap();
        let ids: Vec<String> = entries.into_iter().map(|e| e.file_id).collect();
        assert_eq!(ids, members);
        assert_eq!(api.count(Call::FileMetadata), members.len());
    }

    #[tokio::test]
    async fn test_turn_upload_uses_user_data_purpose() {
        let (api, attachments) = attachments(StubApi::new(), None);
        let uploaded = attachments
            .upload_for_turn(&FileUpload::new(b"x".to_vec(), None))
            .await
            .unwrap();

        assert_eq!(uploaded.filename, "upload.bin");
        assert_eq!(api.uploads(), vec![("upload.bin".to_string(), FilePurpose::UserData)]);
    }
}
