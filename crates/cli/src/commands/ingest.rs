//! Ingest command handler.
//!
//! Rebuilds both knowledge base artifacts from a source directory.

use clap::Args;
use grounded_core::{config::AppConfig, AppResult};
use grounded_knowledge::{ingest_and_persist, ArtifactPaths, Embedder, EmbeddingConfig};
use std::path::PathBuf;

/// Rebuild the knowledge base from a directory of text files
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Source directory (default: the configured knowledge directory)
    pub dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let source_dir = match &self.dir {
            Some(dir) => config.resolve(dir),
            None => config.source_dir(),
        };
        tracing::info!("Executing ingest command for {:?}", source_dir);

        let embedder = Embedder::from_config(&EmbeddingConfig::from_app_config(config))?;
        let paths = ArtifactPaths::from_app_config(config);

        let (_, stats) = ingest_and_persist(&source_dir, &embedder, &paths).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Ingested {} files ({} bytes) in {:.2}s",
                stats.files_count, stats.bytes_processed, stats.duration_secs
            );
            if stats.fallback_embeddings > 0 {
                println!(
                    "{} embeddings used the offline fallback",
                    stats.fallback_embeddings
                );
            }
            println!("Index: {}", paths.index.display());
            println!("Chunks: {}", paths.chunks.display());
        }

        Ok(())
    }
}
