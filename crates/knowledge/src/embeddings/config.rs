//! Embedding configuration.

use grounded_core::AppConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedding configuration shared by ingestion and querying.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ollama" or "hash"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Base URL of the inference server
    pub endpoint: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            provider: config.embedding_provider.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dim,
            endpoint: config.endpoint.clone(),
            timeout_secs: config.embed_timeout_secs,
        }
    }

    /// Offline configuration: hash embeddings only.
    pub fn offline(dimensions: usize) -> Self {
        Self {
            provider: "hash".to_string(),
            model: "sha256-tile".to_string(),
            dimensions,
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
