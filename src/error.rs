//! Error taxonomy for the orchestration core
//!
//! Information Hiding:
//! - Transport-level failures are classified once, at the client boundary
//! - Callers match on `ErrorKind` instead of inspecting messages

use thiserror::Error;

/// Stable error classification for routing layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Configuration,
    Remote,
    Payload,
    PartialFailure,
    Session,
}

impl ErrorKind {
    /// HTTP status a front-end should answer with for this kind
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Configuration => 503,
            ErrorKind::Remote | ErrorKind::Payload | ErrorKind::PartialFailure => 502,
            ErrorKind::Session => 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{operation} failed with status {status}: {body}")]
    Remote {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} request could not be sent: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("empty response body from {operation}")]
    EmptyPayload { operation: &'static str },

    #[error("malformed response from {operation}: {reason}")]
    MalformedPayload {
        operation: &'static str,
        reason: String,
    },

    #[error("file {file_id} was uploaded but not attached to the index: {source}")]
    PartialFailure {
        file_id: String,
        #[source]
        source: Box<ChatError>,
    },

    #[error("session store error: {0}")]
    Session(String),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::Validation(_) => ErrorKind::Validation,
            ChatError::Configuration(_) => ErrorKind::Configuration,
            ChatError::Remote { .. } | ChatError::Transport { .. } => ErrorKind::Remote,
            ChatError::EmptyPayload { .. } | ChatError::MalformedPayload { .. } => {
                ErrorKind::Payload
            }
            ChatError::PartialFailure { .. } => ErrorKind::PartialFailure,
            ChatError::Session(_) => ErrorKind::Session,
        }
    }

    /// Upstream status, when the remote API answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Remote { status, .. } => Some(*status),
            ChatError::PartialFailure { source, .. } => source.status(),
            _ => None,
        }
    }

    /// File left uploaded but unindexed, for attach retries
    pub fn orphaned_file_id(&self) -> Option<&str> {
        match self {
            ChatError::PartialFailure { file_id, .. } => Some(file_id),
            _ => None,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ChatError::Validation(message.into())
    }

    pub(crate) fn missing_index() -> Self {
        ChatError::Configuration("openai.vector_store_id is not configured".to_string())
    }
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;
