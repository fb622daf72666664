//! Build a knowledge base from a directory of text files.
//!
//! Every regular file under the source directory becomes exactly one chunk,
//! labelled with its file name. No splitting is performed.

use crate::config::ArtifactPaths;
use crate::embeddings::{Embedder, EmbeddingOrigin};
use crate::knowledge_base::KnowledgeBase;
use crate::types::{Chunk, IngestStats};
use grounded_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::instrument;
use walkdir::WalkDir;

/// A source file read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub chunk: Chunk,
}

/// Read every regular file below `source_dir`, in file-name order per directory.
///
/// # Errors
/// * `AppError::Knowledge` - If `source_dir` is not a directory or cannot be walked
/// * `AppError::Io` - If a file cannot be read or is not valid UTF-8
pub fn collect_documents(source_dir: &Path) -> AppResult<Vec<SourceDocument>> {
    if !source_dir.is_dir() {
        return Err(AppError::Knowledge(format!(
            "Source directory {:?} does not exist",
            source_dir
        )));
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(source_dir)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            AppError::Knowledge(format!("Failed to walk {:?}: {}", source_dir, e))
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {:?}: {}", path, e),
            ))
        })?;

        let source = entry.file_name().to_string_lossy().into_owned();
        tracing::debug!("Collected {:?} ({} bytes)", path, raw.len());

        documents.push(SourceDocument {
            path: path.to_path_buf(),
            chunk: Chunk::new(raw.trim(), source),
        });
    }

    Ok(documents)
}

/// Build a knowledge base from `source_dir` without touching disk artifacts.
///
/// # Errors
/// * `AppError::EmptyCorpus` - If no files are found
#[instrument(skip(embedder), fields(provider = %embedder.provider_name()))]
pub async fn ingest(
    source_dir: &Path,
    embedder: &Embedder,
) -> AppResult<(KnowledgeBase, IngestStats)> {
    let start = Instant::now();

    let documents = collect_documents(source_dir)?;
    if documents.is_empty() {
        return Err(AppError::EmptyCorpus {
            path: source_dir.to_path_buf(),
        });
    }

    tracing::info!("Ingesting {} files from {:?}", documents.len(), source_dir);

    let mut pairs = Vec::with_capacity(documents.len());
    let mut bytes_processed = 0u64;
    let mut fallback_embeddings = 0usize;

    for document in documents {
        let embedding = embedder.embed_detailed(&document.chunk.text).await;
        if embedding.origin == EmbeddingOrigin::Fallback {
            fallback_embeddings += 1;
        }

        bytes_processed += document.chunk.text.len() as u64;
        pairs.push((embedding.vector, document.chunk));
    }

    let files_count = pairs.len();
    let kb = KnowledgeBase::from_pairs(embedder.dimensions(), pairs)?;

    if fallback_embeddings > 0 {
        tracing::warn!(
            "{} of {} embeddings used the hash fallback",
            fallback_embeddings,
            files_count
        );
    }

    let duration = start.elapsed();
    tracing::info!(
        "Ingestion completed: {} files, {} bytes in {:.2}s",
        files_count,
        bytes_processed,
        duration.as_secs_f64()
    );

    let stats = IngestStats {
        files_count,
        bytes_processed,
        fallback_embeddings,
        dimension: kb.dimension(),
        duration_secs: duration.as_secs_f64(),
        completed_at: chrono::Utc::now(),
    };

    Ok((kb, stats))
}

/// Ingest and replace both persisted artifacts.
pub async fn ingest_and_persist(
    source_dir: &Path,
    embedder: &Embedder,
    paths: &ArtifactPaths,
) -> AppResult<(KnowledgeBase, IngestStats)> {
    let (kb, stats) = ingest(source_dir, embedder).await?;
    kb.save(paths)?;
    Ok((kb, stats))
}
