//! Exact L2 vector index.
//!
//! Vectors are stored row-major in one flat buffer and searched by a full
//! scan. Results are ordered by ascending squared Euclidean distance, ties
//! broken by insertion position.

use crate::persist::write_atomically;
use grounded_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Version tag written into every index artifact.
const INDEX_FORMAT_VERSION: u32 = 2;

/// SHA-256 of the chunk log an index was saved alongside.
pub type ChunkLogDigest = [u8; 32];

/// Flat, append-only vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    data: Vec<f32>,
}

/// On-disk layout, borrowed for writing.
#[derive(Serialize)]
struct IndexArtifactRef<'a> {
    format_version: u32,
    chunk_log_sha256: ChunkLogDigest,
    dimension: usize,
    count: usize,
    data: &'a [f32],
}

/// On-disk layout, owned for reading.
#[derive(Deserialize)]
struct IndexArtifact {
    format_version: u32,
    chunk_log_sha256: ChunkLogDigest,
    dimension: usize,
    count: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimension` elements.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The vector stored at `position`.
    pub fn get(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Append vectors in order.
    ///
    /// The whole batch is validated first; on `DimensionMismatch` nothing is
    /// appended.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> AppResult<()> {
        for vector in vectors {
            self.check_dimension(vector.len())?;
        }

        self.data.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }

        Ok(())
    }

    /// Up to `k` nearest positions with their squared L2 distance.
    ///
    /// An empty index yields an empty result for any query.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<(usize, f32)>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        self.check_dimension(query.len())?;

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, vector)| (position, squared_l2(query, vector)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored)
    }

    /// Persist the index, stamped with the digest of its chunk log. The file
    /// is replaced atomically.
    pub fn save(&self, path: &Path, chunk_log_sha256: &ChunkLogDigest) -> AppResult<()> {
        let artifact = IndexArtifactRef {
            format_version: INDEX_FORMAT_VERSION,
            chunk_log_sha256: *chunk_log_sha256,
            dimension: self.dimension,
            count: self.len(),
            data: &self.data,
        };

        write_atomically(path, |writer| {
            bincode::serialize_into(writer, &artifact)?;
            Ok(())
        })?;

        tracing::debug!(
            "Saved index with {} vectors of dimension {} to {:?}",
            self.len(),
            self.dimension,
            path
        );
        Ok(())
    }

    /// Load an index written by [`VectorIndex::save`] together with its stamp.
    pub fn load(path: &Path) -> AppResult<(Self, ChunkLogDigest)> {
        let file = File::open(path).map_err(|e| {
            AppError::Knowledge(format!("Failed to open index {:?}: {}", path, e))
        })?;

        let artifact: IndexArtifact = bincode::deserialize_from(BufReader::new(file))?;

        if artifact.format_version != INDEX_FORMAT_VERSION {
            return Err(AppError::Knowledge(format!(
                "Unsupported index format version {} in {:?}",
                artifact.format_version, path
            )));
        }

        let expected_len = artifact.count.checked_mul(artifact.dimension);
        if artifact.dimension == 0 || expected_len != Some(artifact.data.len()) {
            return Err(AppError::Knowledge(format!(
                "Corrupt index {:?}: {} values for {} vectors of dimension {}",
                path,
                artifact.data.len(),
                artifact.count,
                artifact.dimension
            )));
        }

        let index = Self {
            dimension: artifact.dimension,
            data: artifact.data,
        };
        Ok((index, artifact.chunk_log_sha256))
    }

    fn check_dimension(&self, actual: usize) -> AppResult<()> {
        if actual != self.dimension {
            return Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
