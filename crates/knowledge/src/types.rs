//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use grounded_prompt::FALLBACK_ANSWER;
use serde::{Deserialize, Serialize};

/// One unit of retrievable text and its provenance label.
///
/// Persisted as one JSON object per line in the chunk log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Trimmed document text
    pub text: String,

    /// Origin identifier (the source file name); not necessarily unique
    pub source: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

/// A chunk returned by a search, with its index position and squared L2 distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Position in the index and chunk store
    pub position: usize,

    /// Squared Euclidean distance to the query (lower is closer)
    pub distance: f32,

    pub chunk: Chunk,
}

/// Result of answering a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer, or the fixed fallback sentence
    pub answer: String,

    /// Sources of the passages placed in the prompt, in ranked order.
    /// Always empty for a fallback answer.
    pub sources: Vec<String>,
}

impl Answer {
    /// The literal "don't know" answer with no sources.
    pub fn fallback() -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }

    /// Whether this is the fixed fallback answer.
    pub fn is_fallback(&self) -> bool {
        self.answer == FALLBACK_ANSWER && self.sources.is_empty()
    }
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    /// Number of files turned into chunks
    pub files_count: usize,

    /// Total bytes of trimmed text embedded
    pub bytes_processed: u64,

    /// Embeddings produced by the local hash fallback
    pub fallback_embeddings: usize,

    /// Vector dimension of the built index
    pub dimension: usize,

    /// Duration in seconds
    pub duration_secs: f64,

    /// When the run finished
    pub completed_at: DateTime<Utc>,
}
