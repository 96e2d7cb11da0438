mod settings;

pub use settings::{
    ChatConfig, ContinuityMode, LoggingConfig, OpenAIConfig, SessionConfig, Settings,
    DEFAULT_BASE_URL, DEFAULT_DEVELOPER_PROMPT, DEFAULT_MODEL,
};
