use crate::error::{ChatError, ChatResult};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

pub const DEFAULT_DEVELOPER_PROMPT: &str = "You are an assistant helping users analyze documents and answer questions. \
Prefer information from uploaded documents and file search results over general knowledge. \
Be concise and factual. \
If the answer is not contained in the provided context, say so clearly.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub openai: OpenAIConfig,
    pub chat: ChatConfig,
    pub sessions: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub vector_store_id: Option<String>,
}

/// Which continuity strategy the deployment runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuityMode {
    DurableConversation,
    PreviousResponse,
    SharedHistory,
}

impl ContinuityMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ContinuityMode::DurableConversation => "durable_conversation",
            ContinuityMode::PreviousResponse => "previous_response",
            ContinuityMode::SharedHistory => "shared_history",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub continuity: ContinuityMode,
    #[serde(default)]
    pub developer_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub storage_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .set_default("openai.base_url", DEFAULT_BASE_URL)?
            .set_default("openai.model", DEFAULT_MODEL)?
            .set_default("chat.continuity", "durable_conversation")?
            .set_default("chat.developer_prompt", DEFAULT_DEVELOPER_PROMPT)?
            .set_default("sessions.storage_dir", "./sessions")?
            .set_default("logging.level", "info")?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// API key from `OPENAI_API_KEY`, falling back to `openai.api_key`
    pub fn api_key(&self) -> ChatResult<String> {
        resolve_api_key(env::var("OPENAI_API_KEY").ok(), self.openai.api_key.as_deref())
    }

    /// Configured vector store, `None` when unset or blank
    pub fn vector_store_id(&self) -> Option<String> {
        non_blank(self.openai.vector_store_id.as_deref())
    }

    pub fn model(&self) -> String {
        non_blank(Some(&self.openai.model)).unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn base_url(&self) -> String {
        non_blank(Some(&self.openai.base_url)).unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn developer_prompt(&self) -> Option<String> {
        non_blank(self.chat.developer_prompt.as_deref())
    }
}

fn resolve_api_key(from_env: Option<String>, configured: Option<&str>) -> ChatResult<String> {
    non_blank(from_env.as_deref())
        .or_else(|| non_blank(configured))
        .ok_or_else(|| {
            ChatError::Configuration(
                "missing OpenAI API key; set OPENAI_API_KEY or openai.api_key".to_string(),
            )
        })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
