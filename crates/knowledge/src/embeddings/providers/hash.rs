//! Deterministic hash embedding provider.
//!
//! The SHA-256 digest of the text is tiled to the target dimension, each byte
//! is taken as an unsigned integer and the vector is L2-normalized. Identical
//! text always yields the identical vector, so it doubles as the offline
//! fallback for remote providers.

use crate::embeddings::provider::EmbeddingProvider;
use grounded_core::AppResult;
use sha2::{Digest, Sha256};

/// Hash-based embedding provider for offline operation and fallback.
#[derive(Debug, Clone)]
pub struct HashProvider {
    dimensions: usize,
}

impl HashProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Compute the embedding synchronously.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        hash_embedding(text, self.dimensions)
    }
}

/// Hash embedding of `text` with `dimensions` elements and unit L2 norm.
pub fn hash_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());

    let mut embedding: Vec<f32> = digest
        .iter()
        .cycle()
        .take(dimensions)
        .map(|&b| f32::from(b))
        .collect();

    // Zero only if every digest byte is zero
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut embedding {
            *v /= norm;
        }
    }

    embedding
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashProvider {
    fn provider_name(&self) -> &str {
        "hash"
    }

    fn model_name(&self) -> &str {
        "sha256-tile"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        Ok(self.embed_sync(text))
    }
}
