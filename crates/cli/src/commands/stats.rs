//! Stats command handler.
//!
//! Reports whether a knowledge base is present and what it holds.

use clap::Args;
use grounded_core::{config::AppConfig, AppResult};
use grounded_knowledge::{ArtifactPaths, KnowledgeBase};

/// Show knowledge base status
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let paths = ArtifactPaths::from_app_config(config);
        let kb = KnowledgeBase::load(&paths)?;

        let ready = kb.is_some();
        let chunks = kb.as_ref().map(|kb| kb.len()).unwrap_or(0);
        let dimension = kb.as_ref().map(|kb| kb.dimension());
        let index_bytes = std::fs::metadata(&paths.index).map(|m| m.len()).ok();

        if self.json {
            let output = serde_json::json!({
                "ready": ready,
                "chunksCount": chunks,
                "dimension": dimension,
                "configuredDimension": config.embedding_dim,
                "embeddingProvider": config.embedding_provider,
                "indexPath": paths.index,
                "chunksPath": paths.chunks,
                "indexBytes": index_bytes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if !ready {
            println!("No knowledge base. Run 'grounded ingest' to build one.");
        } else {
            println!("Chunks: {}", chunks);
            if let Some(dimension) = dimension {
                println!("Dimension: {}", dimension);
                if dimension != config.embedding_dim {
                    println!(
                        "Warning: configured embedding dimension is {}; reingest to match",
                        config.embedding_dim
                    );
                }
            }
        }
        println!("Embedding provider: {}", config.embedding_provider);
        println!("Index: {}", paths.index.display());
        println!("Chunks log: {}", paths.chunks.display());

        Ok(())
    }
}
