//! A vector index paired with its chunk store.

use crate::chunk_store::{read_chunk_log, write_chunk_log, ChunkStore};
use crate::config::ArtifactPaths;
use crate::types::{Chunk, ScoredChunk};
use crate::vector_index::{ChunkLogDigest, VectorIndex};
use grounded_core::{AppError, AppResult};
use sha2::{Digest, Sha256};

/// Immutable once built; replaced wholesale on reindex.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    index: VectorIndex,
    chunks: ChunkStore,
}

impl KnowledgeBase {
    /// Pair an index with its chunks. Both must hold the same number of entries.
    pub fn new(index: VectorIndex, chunks: ChunkStore) -> AppResult<Self> {
        if index.len() != chunks.len() {
            return Err(AppError::Knowledge(format!(
                "Index holds {} vectors but chunk store holds {} chunks",
                index.len(),
                chunks.len()
            )));
        }
        Ok(Self { index, chunks })
    }

    /// Build from `(vector, chunk)` pairs in position order.
    pub fn from_pairs(
        dimension: usize,
        pairs: impl IntoIterator<Item = (Vec<f32>, Chunk)>,
    ) -> AppResult<Self> {
        let (vectors, chunks): (Vec<Vec<f32>>, ChunkStore) = pairs.into_iter().unzip();

        let mut index = VectorIndex::new(dimension);
        index.add(&vectors)?;

        Self::new(index, chunks)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn chunks(&self) -> &ChunkStore {
        &self.chunks
    }

    /// Nearest chunks to `query`, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<ScoredChunk>> {
        self.index
            .search(query, k)?
            .into_iter()
            .map(|(position, distance)| {
                let chunk = self.chunks.get(position).ok_or_else(|| {
                    AppError::Knowledge(format!(
                        "Index position {} has no chunk ({} chunks stored)",
                        position,
                        self.chunks.len()
                    ))
                })?;
                Ok(ScoredChunk {
                    position,
                    distance,
                    chunk: chunk.clone(),
                })
            })
            .collect()
    }

    /// Persist both artifacts. Chunks are written before the index, which
    /// records the SHA-256 of the chunk log it was built with.
    pub fn save(&self, paths: &ArtifactPaths) -> AppResult<()> {
        let chunk_log = self.chunks.to_jsonl()?;
        write_chunk_log(&paths.chunks, &chunk_log)?;
        self.index.save(&paths.index, &chunk_log_digest(&chunk_log))?;

        tracing::info!(
            "Persisted knowledge base: {} chunks, dimension {}",
            self.len(),
            self.dimension()
        );
        Ok(())
    }

    /// Load both artifacts. Returns `None` when either is missing.
    ///
    /// # Errors
    /// * `AppError::Knowledge` - If the index was not saved with this chunk log
    pub fn load(paths: &ArtifactPaths) -> AppResult<Option<Self>> {
        if !paths.exist() {
            tracing::debug!(
                "No persisted knowledge base at {:?} / {:?}",
                paths.index,
                paths.chunks
            );
            return Ok(None);
        }

        let chunk_log = read_chunk_log(&paths.chunks)?;
        let (index, stamp) = VectorIndex::load(&paths.index)?;

        if stamp != chunk_log_digest(&chunk_log) {
            return Err(AppError::Knowledge(format!(
                "Index {:?} and chunk log {:?} do not belong together; re-run ingest",
                paths.index, paths.chunks
            )));
        }

        let chunks = ChunkStore::from_jsonl(&chunk_log, &paths.chunks)?;
        Self::new(index, chunks).map(Some)
    }
}

fn chunk_log_digest(bytes: &[u8]) -> ChunkLogDigest {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Sha256::digest(bytes));
    digest
}
