//! Chat message request types.

use serde::Serialize;

/// Body of `POST /chat-messages`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub inputs: ChatInputs,
    pub query: String,
    pub user: String,
    pub response_mode: String,
}

/// App input variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatInputs {
    pub profile_context: String,
    pub mode: String,
}

impl ChatRequest {
    /// Blocking-mode request, answered in a single response.
    pub fn blocking(inputs: ChatInputs, query: impl Into<String>, user: impl Into<String>) -> Self {
        Self { inputs, query: query.into(), user: user.into(), response_mode: "blocking".to_string() }
    }
}
