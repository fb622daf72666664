//! Generation client abstraction and request/response types.
//!
//! The answer pipeline treats the language model as a black box behind
//! [`LlmClient`]: one prompt in, one completed text out.

use grounded_core::AppResult;
use serde::{Deserialize, Serialize};

/// Generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The fully composed prompt
    pub prompt: String,

    /// Model identifier (e.g., "llama3.1:8b-instruct")
    pub model: String,
}

impl LlmRequest {
    /// Create a new request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
        }
    }
}

/// Completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,
}

/// Trait for generation backends.
///
/// Implementations perform exactly one attempt per call and report any
/// transport, status or decoding problem as `AppError::BackendUnavailable`.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}
