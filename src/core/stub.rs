//! Call-recording `RemoteApi` double for orchestration tests

use crate::core::remote::{
    FilePurpose, FileUpload, InputItem, RemoteApi, ResponseRequest, UploadedFile,
};
use crate::error::{ChatError, ChatResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    CreateConversation,
    CreateResponse,
    UploadFile,
    AttachToIndex,
    ListIndexMembers,
    FileMetadata,
    DetachFromIndex,
}

#[derive(Default)]
pub(crate) struct StubApi {
    pub(crate) calls: Mutex<Vec<Call>>,
    pub(crate) conversation_seeds: Mutex<Vec<Vec<InputItem>>>,
    pub(crate) requests: Mutex<Vec<ResponseRequest>>,
    pub(crate) uploads: Mutex<Vec<(String, FilePurpose)>>,
    pub(crate) index_members: Vec<String>,
    pub(crate) filenames: HashMap<String, String>,
    pub(crate) failing_metadata: HashSet<String>,
    pub(crate) fail_attach: bool,
    pub(crate) fail_detach: bool,
    pub(crate) fail_response: bool,
    pub(crate) fail_upload: bool,
}

impl StubApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.iter().filter(|c| **c == call).count()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, call: Call) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls().len()
    }

    pub(crate) fn requests(&self) -> Vec<ResponseRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn conversation_seeds(&self) -> Vec<Vec<InputItem>> {
        self.conversation_seeds.lock().unwrap().clone()
    }

    pub(crate) fn uploads(&self) -> Vec<(String, FilePurpose)> {
        self.uploads.lock().unwrap().clone()
    }

    fn failure(operation: &'static str) -> ChatError {
        ChatError::Remote {
            operation,
            status: 500,
            body: "stub failure".to_string(),
        }
    }
}

#[async_trait]
impl RemoteApi for StubApi {
    async fn create_conversation(&self, items: &[InputItem]) -> ChatResult<String> {
        let n = self.record(Call::CreateConversation);
        self.conversation_seeds.lock().unwrap().push(items.to_vec());
        Ok(format!("conv_{}", n))
    }

    async fn create_response(&self, request: &ResponseRequest) -> ChatResult<Value> {
        let n = self.record(Call::CreateResponse);
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_response {
            return Err(Self::failure("create-response"));
        }
        Ok(json!({
            "id": format!("resp_{}", n),
            "output": [{"content": [{"type": "output_text", "text": format!("reply {}", n)}]}]
        }))
    }

    async fn upload_file(
        &self,
        upload: &FileUpload,
        purpose: FilePurpose,
    ) -> ChatResult<UploadedFile> {
        let n = self.record(Call::UploadFile);
        if self.fail_upload {
            return Err(Self::failure("upload-file"));
        }
        let filename = upload.display_name();
        self.uploads.lock().unwrap().push((filename.clone(), purpose));
        Ok(UploadedFile {
            file_id: format!("file_{}", n),
            filename,
        })
    }

    async fn attach_to_index(&self, _index_id: &str, file_id: &str) -> ChatResult<Value> {
        self.record(Call::AttachToIndex);
        if self.fail_attach {
            return Err(Self::failure("attach-to-index"));
        }
        Ok(json!({"id": file_id, "status": "in_progress"}))
    }

    async fn list_index_members(&self, _index_id: &str) -> ChatResult<Vec<String>> {
        self.record(Call::ListIndexMembers);
        Ok(self.index_members.clone())
    }

    async fn file_metadata(&self, file_id: &str) -> ChatResult<String> {
        self.record(Call::FileMetadata);
        if self.failing_metadata.contains(file_id) {
            return Err(Self::failure("get-file-metadata"));
        }
        Ok(self
            .filenames
            .get(file_id)
            .cloned()
            .unwrap_or_else(|| format!("{}.txt", file_id)))
    }

    async fn detach_from_index(&self, _index_id: &str, _file_id: &str) -> ChatResult<()> {
        self.record(Call::DetachFromIndex);
        if self.fail_detach {
            return Err(ChatError::Remote {
                operation: "detach-from-index",
                status: 404,
                body: "no such file".to_string(),
            });
        }
        Ok(())
    }
}
