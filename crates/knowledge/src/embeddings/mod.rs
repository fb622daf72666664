//! Embedding engine for the knowledge base.
//!
//! The [`Embedder`] always returns a vector of the configured dimension: it
//! asks its primary provider first and falls back to the deterministic hash
//! embedding on any failure.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{hash_embedding, HashProvider, OllamaProvider};

use grounded_core::{AppError, AppResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Which path produced an embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingOrigin {
    /// The configured provider answered with a vector of the right size
    Primary,
    /// The local hash fallback was used
    Fallback,
}

/// An embedding tagged with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub origin: EmbeddingOrigin,
}

/// Infallible embedder: primary provider with a hash fallback.
#[derive(Debug, Clone)]
pub struct Embedder {
    primary: Arc<dyn EmbeddingProvider>,
    fallback: HashProvider,
    dimensions: usize,
}

impl Embedder {
    /// Wrap a primary provider. Its vectors must have `dimensions` elements or
    /// they are replaced by the fallback.
    ///
    /// # Errors
    /// * `AppError::Config` - If `dimensions` is zero
    pub fn new(primary: Arc<dyn EmbeddingProvider>, dimensions: usize) -> AppResult<Self> {
        if dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimension must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            primary,
            fallback: HashProvider::new(dimensions),
            dimensions,
        })
    }

    /// Embedder that only uses the hash embedding.
    pub fn offline(dimensions: usize) -> AppResult<Self> {
        Self::new(Arc::new(HashProvider::new(dimensions)), dimensions)
    }

    pub fn from_config(config: &EmbeddingConfig) -> AppResult<Self> {
        let primary = create_provider(config)?;

        tracing::debug!(
            "Embedder ready: provider={}, model={}, dimensions={}",
            primary.provider_name(),
            primary.model_name(),
            config.dimensions
        );

        Self::new(primary, config.dimensions)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn provider_name(&self) -> &str {
        self.primary.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.primary.model_name()
    }

    /// Embed `text`, reporting whether the fallback was needed.
    #[instrument(skip(self, text), fields(text_len = text.len(), provider = %self.primary.provider_name()))]
    pub async fn embed_detailed(&self, text: &str) -> Embedding {
        match self.primary.embed(text).await {
            Ok(vector) if vector.len() == self.dimensions => Embedding {
                vector,
                origin: EmbeddingOrigin::Primary,
            },
            Ok(vector) => {
                tracing::warn!(
                    "Provider returned {} dimensions, expected {}; using hash fallback",
                    vector.len(),
                    self.dimensions
                );
                self.fallback_embedding(text)
            }
            Err(e) => {
                tracing::warn!("Embedding backend failed, using hash fallback: {}", e);
                self.fallback_embedding(text)
            }
        }
    }

    /// Embed `text`. Never fails.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        self.embed_detailed(text).await.vector
    }

    fn fallback_embedding(&self, text: &str) -> Embedding {
        Embedding {
            vector: self.fallback.embed_sync(text),
            origin: EmbeddingOrigin::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FailingProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FailingProvider {
        fn provider_name(&self) -> &str {
            "failing"
        }

        fn model_name(&self) -> &str {
            "none"
        }

        fn dimensions(&self) -> usize {
            8
        }

        async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
            Err(AppError::BackendUnavailable("connection refused".to_string()))
        }
    }

    #[derive(Debug)]
    struct FixedProvider(Vec<f32>);

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedProvider {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        fn model_name(&self) -> &str {
            "fixed"
        }

        fn dimensions(&self) -> usize {
            self.0.len()
        }

        async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_primary_vector_is_used() {
        let embedder =
            Embedder::new(Arc::new(FixedProvider(vec![0.0, 1.0, 0.0])), 3).unwrap();
        let embedding = embedder.embed_detailed("anything").await;

        assert_eq!(embedding.origin, EmbeddingOrigin::Primary);
        assert_eq!(embedding.vector, vec![0.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_backend_error_falls_back_to_hash() {
        let embedder = Embedder::new(Arc::new(FailingProvider), 8).unwrap();
        let embedding = embedder.embed_detailed("refund policy").await;

        assert_eq!(embedding.origin, EmbeddingOrigin::Fallback);
        assert_eq!(embedding.vector, hash_embedding("refund policy", 8));
    }

    #[tokio::test]
    async fn test_wrong_dimension_falls_back_to_hash() {
        let embedder = Embedder::new(Arc::new(FixedProvider(vec![1.0; 5])), 8).unwrap();
        let embedding = embedder.embed_detailed("refund policy").await;

        assert_eq!(embedding.origin, EmbeddingOrigin::Fallback);
        assert_eq!(embedding.vector.len(), 8);
    }

    #[tokio::test]
    async fn test_fallback_is_deterministic_and_unit_norm() {
        let embedder = Embedder::new(Arc::new(FailingProvider), 768).unwrap();

        let first = embedder.embed("same text").await;
        let second = embedder.embed("same text").await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 768);

        let norm: f32 = first.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_offline_embedder() {
        let embedder = Embedder::offline(16).unwrap();
        assert_eq!(embedder.provider_name(), "hash");

        let embedding = embedder.embed_detailed("x").await;
        assert_eq!(embedding.origin, EmbeddingOrigin::Primary);
        assert_eq!(embedding.vector, hash_embedding("x", 16));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(Embedder::offline(0), Err(AppError::Config(_))));
        assert!(Embedder::new(Arc::new(FailingProvider), 0).is_err());
    }

    #[test]
    fn test_from_config_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "bogus".to_string(),
            ..Default::default()
        };
        assert!(Embedder::from_config(&config).is_err());
    }
}
