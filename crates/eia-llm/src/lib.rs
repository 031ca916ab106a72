//! Chat-completions client used to obtain sustainability assessments.

pub mod client;
pub mod error;
pub mod types;

mod retry;

pub use client::ChatClient;
pub use error::LlmError;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Role};
