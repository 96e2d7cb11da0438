//! Remote API contract
//!
//! Information Hiding:
//! - Wire shapes of the responses, conversations, files and vector store
//!   endpoints live here and nowhere else
//! - Orchestration code depends on `RemoteApi`, never on the HTTP client

use crate::error::ChatResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_UPLOAD_FILENAME: &str = "upload.bin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Developer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
    InputFile { file_id: String },
    OutputText { text: String },
}

/// One conversation turn as sent in `input` or as a conversation seed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputItem {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl InputItem {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::InputText { text: text.into() }],
        }
    }

    pub fn user_text_with_file(text: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![
                ContentPart::InputText { text: text.into() },
                ContentPart::InputFile {
                    file_id: file_id.into(),
                },
            ],
        }
    }

    pub fn developer(text: impl Into<String>) -> Self {
        Self {
            role: Role::Developer,
            content: vec![ContentPart::InputText { text: text.into() }],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentPart::OutputText { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolSpec {
    FileSearch { vector_store_ids: Vec<String> },
}

/// Body of `POST /v1/responses`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRequest {
    pub model: String,
    pub input: Vec<InputItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
}

impl ResponseRequest {
    pub fn new(model: impl Into<String>, input: Vec<InputItem>) -> Self {
        Self {
            model: model.into(),
            input,
            conversation: None,
            previous_response_id: None,
            tools: Vec::new(),
        }
    }

    pub fn with_file_search(mut self, vector_store_id: Option<&str>) -> Self {
        if let Some(id) = vector_store_id {
            self.tools.push(ToolSpec::FileSearch {
                vector_store_ids: vec![id.to_string()],
            });
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePurpose {
    /// Direct turn input
    UserData,
    /// Vector store member
    Assistants,
}

impl FilePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            FilePurpose::UserData => "user_data",
            FilePurpose::Assistants => "assistants",
        }
    }
}

/// File bytes supplied by the caller
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
}

impl FileUpload {
    pub fn new(bytes: impl Into<Vec<u8>>, filename: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn display_name(&self) -> String {
        self.filename
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_FILENAME)
            .to_string()
    }
}

/// Reference to a file owned by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_id: String,
    pub filename: String,
}

/// Index membership joined with file metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub file_id: String,
    pub filename: String,
}

/// Logical operations against the hosted API
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Create a durable conversation, returning its id
    async fn create_conversation(&self, items: &[InputItem]) -> ChatResult<String>;

    /// Create a response and return the raw payload
    async fn create_response(&self, request: &ResponseRequest) -> ChatResult<Value>;

    async fn upload_file(&self, upload: &FileUpload, purpose: FilePurpose)
        -> ChatResult<UploadedFile>;

    async fn attach_to_index(&self, index_id: &str, file_id: &str) -> ChatResult<Value>;

    /// File ids currently in the index
    async fn list_index_members(&self, index_id: &str) -> ChatResult<Vec<String>>;

    /// Filename of an uploaded file
    async fn file_metadata(&self, file_id: &str) -> ChatResult<String>;

    async fn detach_from_index(&self, index_id: &str, file_id: &str) -> ChatResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_only_present_linkage() {
        let mut request = ResponseRequest::new("gpt-4.1-mini", vec![InputItem::user_text("hi")]);
        request.conversation = Some("conv_1".to_string());

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4.1-mini",
                "input": [{"role": "user", "content": [{"type": "input_text", "text": "hi"}]}],
                "conversation": "conv_1"
            })
        );
    }

    #[test]
    fn test_file_turn_and_tool_shape() {
        let request = ResponseRequest::new("m", vec![InputItem::user_text_with_file("sum", "file-1")])
            .with_file_search(Some("vs_1"));
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["input"][0]["content"][1], json!({"type": "input_file", "file_id": "file-1"}));
        assert_eq!(
            body["tools"],
            json!([{"type": "file_search", "vector_store_ids": ["vs_1"]}])
        );
        assert!(body.get("previous_response_id").is_none());
    }

    #[test]
    fn test_upload_display_name_defaults() {
        assert_eq!(FileUpload::new(b"x".to_vec(), None).display_name(), "upload.bin");
        assert_eq!(
            FileUpload::new(b"x".to_vec(), Some("  ".to_string())).display_name(),
            "upload.bin"
        );
        assert_eq!(
            FileUpload::new(b"x".to_vec(), Some("notes.pdf".to_string())).display_name(),
            "notes.pdf"
        );
    }

    #[test]
    fn test_assistant_turn_uses_output_text() {
        let body = serde_json::to_value(InputItem::assistant("done")).unwrap();
        assert_eq!(
            body,
            json!({"role": "assistant", "content": [{"type": "output_text", "text": "done"}]})
        );
    }
}
