//! Ask command handler.
//!
//! Answers one question from the published knowledge base.

use clap::Args;
use grounded_core::{config::AppConfig, AppResult};
use grounded_knowledge::AnswerPipeline;

/// Answer a question from the knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve (default: configured top-K)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let pipeline = AnswerPipeline::from_config(config)?;
        if !pipeline.is_ready() {
            tracing::warn!("No knowledge base found; run 'grounded ingest' first");
        }

        let answer = pipeline.answer(&self.question, self.top_k).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            println!("{}", answer.answer);
            if !answer.sources.is_empty() {
                println!();
                println!("Sources:");
                for source in &answer.sources {
                    println!("  - {}", source);
                }
            }
        }

        Ok(())
    }
}
