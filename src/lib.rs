//! docchat - session-aware chat orchestration over a hosted responses API
//!
//! Keeps per-user conversation continuity, optionally enables file search
//! over an uploaded-file index, and attaches ad-hoc files to single turns.
//! Front-ends construct one `ChatService` and pass a `SessionContext` into
//! every call.

pub mod attachments;
pub mod config;
pub mod continuity;
pub mod core;
pub mod error;
pub mod service;
pub mod session;

pub mod cli;
pub mod utils;

pub use config::{ContinuityMode, Settings};
pub use continuity::{strategy_for, ContinuityStrategy, ConversationStatus, HistoryLog};
pub use crate::core::extract::{extract_output_text, NO_TEXT_OUTPUT};
pub use crate::core::openai::OpenAIClient;
pub use crate::core::remote::{FileUpload, IndexEntry, RemoteApi, UploadedFile};
pub use error::{ChatError, ChatResult, ErrorKind};
pub use service::ChatService;
pub use session::{FileSystemSessionStore, InMemorySessionStore, SessionContext, SessionStore};
