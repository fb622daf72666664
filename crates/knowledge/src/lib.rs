//! Knowledge base management and question answering.
//!
//! A knowledge base is a flat L2 [`VectorIndex`] paired position-by-position
//! with a [`ChunkStore`]. The [`ingest`] module builds one from a directory of
//! text files, and the [`AnswerPipeline`] serves questions against whichever
//! knowledge base is currently published in its [`KnowledgeHandle`].

pub mod chunk_store;
pub mod config;
pub mod embeddings;
pub mod handle;
pub mod ingest;
pub mod knowledge_base;
mod persist;
pub mod rag;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunk_store::ChunkStore;
pub use config::{ArtifactPaths, RetrievalSettings};
pub use embeddings::{Embedder, EmbeddingConfig, EmbeddingOrigin};
pub use handle::KnowledgeHandle;
pub use ingest::{collect_documents, ingest, ingest_and_persist, SourceDocument};
pub use knowledge_base::KnowledgeBase;
pub use rag::AnswerPipeline;
pub use types::{Answer, Chunk, IngestStats, ScoredChunk};
pub use vector_index::VectorIndex;
