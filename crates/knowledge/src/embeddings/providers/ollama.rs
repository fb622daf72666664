//! Ollama Embedding Provider
//!
//! Calls Ollama's `/api/embeddings` endpoint with a short timeout. Exactly one
//! attempt is made per text; the [`Embedder`](crate::embeddings::Embedder)
//! turns any failure into the deterministic hash fallback.

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use grounded_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Ollama embedding provider using the local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// HTTP client carrying the request timeout
    client: Client,
    /// Ollama API base URL
    base_url: String,
    /// Model name (e.g., "nomic-embed-text")
    model: String,
    /// Expected embedding dimensions
    dimensions: usize,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider. Does not contact the server.
    ///
    /// # Errors
    /// * `AppError::Config` - If the HTTP client cannot be built
    pub fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                AppError::Config(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    fn check_dimensions(&self, embedding: &[f32]) -> AppResult<()> {
        if embedding.len() != self.dimensions {
            return Err(AppError::BackendUnavailable(format!(
                "Unexpected embedding dimensions: got {}, expected {}",
                embedding.len(),
                self.dimensions
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    #[instrument(skip(self, text), fields(text_len = text.len(), provider = "ollama", model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);

        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::BackendUnavailable(format!("Failed to send request to Ollama: {}", e))
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|r| r.error)
                .unwrap_or(error_text);

            return Err(AppError::BackendUnavailable(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::BackendUnavailable(format!("Failed to parse Ollama response: {}", e))
        })?;

        self.check_dimensions(&body.embedding)?;

        debug!("Generated {} dimensional embedding", body.embedding.len());

        Ok(body.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 4,
            endpoint: "http://localhost:11434/".to_string(),
            timeout_secs: 1,
        }
    }

    #[test]
    fn test_provider_fields() {
        let provider = OllamaProvider::new(&create_test_config()).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
        assert_eq!(provider.dimensions(), 4);
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "nomic-embed-text");
    }

    #[test]
    fn test_request_shape() {
        let body = serde_json::to_value(EmbeddingRequest {
            model: "nomic-embed-text",
            prompt: "hi",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"model": "nomic-embed-text", "prompt": "hi"}));
    }

    #[test]
    fn test_wrong_dimensions_is_backend_error() {
        let provider = OllamaProvider::new(&create_test_config()).unwrap();
        assert!(provider.check_dimensions(&[0.1, 0.2, 0.3, 0.4]).is_ok());
        assert!(matches!(
            provider.check_dimensions(&[0.1, 0.2]),
            Err(AppError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_malformed_response_rejected() {
        assert!(serde_json::from_str::<EmbeddingResponse>(r#"{"embeddings": []}"#).is_err());
        assert!(serde_json::from_str::<EmbeddingResponse>(r#"{"embedding": [0.5, 1]}"#).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_backend_error() {
        let config = EmbeddingConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            ..create_test_config()
        };
        let provider = OllamaProvider::new(&config).unwrap();

        let result = provider.embed("hello").await;
        assert!(matches!(result, Err(AppError::BackendUnavailable(_))));
    }
}
