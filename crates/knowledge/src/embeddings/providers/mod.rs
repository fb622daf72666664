//! Embedding provider implementations.

pub mod hash;
pub mod ollama;

pub use hash::{hash_embedding, HashProvider};
pub use ollama::OllamaProvider;
