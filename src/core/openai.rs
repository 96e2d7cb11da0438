use crate::core::extract::parse_payload;
use crate::core::remote::{FilePurpose, FileUpload, InputItem, RemoteApi, ResponseRequest, UploadedFile};
use crate::error::{ChatError, ChatResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::{json, Value};

/// HTTP client for the hosted API.
/// Every request carries the bearer key through the client's default headers.
pub struct OpenAIClient {
    client: Client,
    base_url: Url,
}

impl OpenAIClient {
    pub fn new(api_key: &str, base_url: impl Into<String>) -> ChatResult<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ChatError::Configuration("OpenAI API key is blank".to_string()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| ChatError::Configuration(format!("invalid API key: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ChatError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        let base_url: String = base_url.into();
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ChatError::Configuration(format!("invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ChatError::Configuration(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Endpoint under the base URL. Each segment is percent-encoded on its
    /// own, so ids can never add or remove path segments.
    fn endpoint(&self, segments: &[&str]) -> ChatResult<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| matches!(segment.trim(), "" | "." | ".."))
        {
            return Err(ChatError::validation(format!("invalid path segment '{}'", bad)));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ChatError::Configuration(format!("base URL '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send and return the body of a successful response
    async fn send(&self, operation: &'static str, request: RequestBuilder) -> ChatResult<String> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("[OpenAIClient] {} request failed: {}", operation, e);
            ChatError::Transport {
                operation,
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ChatError::Transport {
            operation,
            message: format!("failed to read body: {}", e),
        })?;

        if !status.is_success() {
            tracing::warn!(
                "[OpenAIClient] {} returned error status {}: {}",
                operation,
                status,
                body
            );
            return Err(ChatError::Remote {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("[OpenAIClient] {} succeeded ({} bytes)", operation, body.len());
        Ok(body)
    }

    async fn send_json(&self, operation: &'static str, request: RequestBuilder) -> ChatResult<Value> {
        let body = self.send(operation, request).await?;
        parse_payload(operation, &body)
    }
}

fn required_str(payload: &Value, field: &str, operation: &'static str) -> ChatResult<String> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ChatError::MalformedPayload {
            operation,
            reason: format!("missing '{}' field", field),
        })
}

#[async_trait]
impl RemoteApi for OpenAIClient {
    async fn create_conversation(&self, items: &[InputItem]) -> ChatResult<String> {
        const OP: &str = "create-conversation";
        let body = if items.is_empty() {
            json!({})
        } else {
            json!({ "items": items })
        };

        let payload = self
            .send_json(OP, self.client.post(self.endpoint(&["v1", "conversations"])?).json(&body))
            .await?;
        required_str(&payload, "id", OP)
    }

    async fn create_response(&self, request: &ResponseRequest) -> ChatResult<Value> {
        self.send_json(
            "create-response",
            self.client.post(self.endpoint(&["v1", "responses"])?).json(request),
        )
        .await
    }

    async fn upload_file(
        &self,
        upload: &FileUpload,
        purpose: FilePurpose,
    ) -> ChatResult<UploadedFile> {
        const OP: &str = "upload-file";
        let filename = upload.display_name();
        let part = Part::bytes(upload.bytes.clone()).file_name(filename.clone());
        let form = Form::new()
            .text("purpose", purpose.as_str())
            .part("file", part);

        let payload = self
            .send_json(OP, self.client.post(self.endpoint(&["v1", "files"])?).multipart(form))
            .await?;

        Ok(UploadedFile {
            file_id: required_str(&payload, "id", OP)?,
            filename,
        })
    }

    async fn attach_to_index(&self, index_id: &str, file_id: &str) -> ChatResult<Value> {
        let url = self.endpoint(&["v1", "vector_stores", index_id, "files"])?;
        self.send_json(
            "attach-to-index",
            self.client.post(url).json(&json!({ "file_id": file_id })),
        )
        .await
    }

    async fn list_index_members(&self, index_id: &str) -> ChatResult<Vec<String>> {
        const OP: &str = "list-index-members";
        let url = self.endpoint(&["v1", "vector_stores", index_id, "files"])?;
        let payload = self.send_json(OP, self.client.get(url)).await?;

        let data = payload
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| ChatError::MalformedPayload {
                operation: OP,
                reason: "missing 'data' array".to_string(),
            })?;

        Ok(data
            .iter()
            .filter_map(|member| member.get("id").and_then(Value::as_str))
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn file_metadata(&self, file_id: &str) -> ChatResult<String> {
        const OP: &str = "get-file-metadata";
        let url = self.endpoint(&["v1", "files", file_id])?;
        let payload = self.send_json(OP, self.client.get(url)).await?;
        required_str(&payload, "filename", OP)
    }

    async fn detach_from_index(&self, index_id: &str, file_id: &str) -> ChatResult<()> {
        let url = self.endpoint(&["v1", "vector_stores", index_id, "files", file_id])?;
        self.send("detach-from-index", self.client.delete(url)).await?;
        Ok(())
    }
}
