//! Position-addressed chunk storage persisted as JSON Lines.

use crate::persist::write_atomically;
use crate::types::Chunk;
use grounded_core::{AppError, AppResult};
use std::io::Write;
use std::path::Path;

/// Ordered list of chunks. Position `i` pairs with vector `i` of the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkStore {
    chunks: Vec<Chunk>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return its position.
    pub fn append(&mut self, chunk: Chunk) -> usize {
        self.chunks.push(chunk);
        self.chunks.len() - 1
    }

    pub fn get(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Serialize as JSON Lines: one object per line, in position order.
    pub fn to_jsonl(&self) -> AppResult<Vec<u8>> {
        let mut buf = Vec::new();
        for chunk in &self.chunks {
            serde_json::to_writer(&mut buf, chunk)?;
            buf.push(b'\n');
        }
        Ok(buf)
    }

    /// Parse a chunk log. Blank lines are ignored; `origin` only labels errors.
    pub fn from_jsonl(bytes: &[u8], origin: &Path) -> AppResult<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            AppError::Serialization(format!("Chunk log {:?} is not UTF-8: {}", origin, e))
        })?;

        let mut chunks = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let chunk: Chunk = serde_json::from_str(line).map_err(|e| {
                AppError::Serialization(format!(
                    "Malformed chunk record at {:?} line {}: {}",
                    origin,
                    line_no + 1,
                    e
                ))
            })?;
            chunks.push(chunk);
        }

        Ok(Self { chunks })
    }

    /// Write the chunk log atomically.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let bytes = self.to_jsonl()?;
        write_chunk_log(path, &bytes)?;

        tracing::debug!("Saved {} chunks to {:?}", self.chunks.len(), path);
        Ok(())
    }

    /// Read a chunk log. Blank lines are ignored.
    pub fn load(path: &Path) -> AppResult<Self> {
        Self::from_jsonl(&read_chunk_log(path)?, path)
    }
}

/// Replace the chunk log at `path` with `bytes`.
pub(crate) fn write_chunk_log(path: &Path, bytes: &[u8]) -> AppResult<()> {
    write_atomically(path, |writer| {
        writer.write_all(bytes)?;
        Ok(())
    })
}

/// Raw bytes of the chunk log at `path`.
pub(crate) fn read_chunk_log(path: &Path) -> AppResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        AppError::Knowledge(format!("Failed to open chunk log {:?}: {}", path, e))
    })
}

impl FromIterator<Chunk> for ChunkStore {
    fn from_iter<I: IntoIterator<Item = Chunk>>(iter: I) -> Self {
        Self {
            chunks: iter.into_iter().collect(),
        }
    }
}

impl Extend<Chunk> for ChunkStore {
    fn extend<I: IntoIterator<Item = Chunk>>(&mut self, iter: I) {
        self.chunks.extend(iter);
    }
}
