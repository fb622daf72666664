//! Search command handler.
//!
//! Shows the ranked chunks retrieval would hand to the generator.

use clap::Args;
use grounded_core::{config::AppConfig, AppResult};
use grounded_knowledge::AnswerPipeline;

/// Maximum characters shown per chunk in text output.
const MAX_PREVIEW_CHARS: usize = 120;

/// Show the chunks retrieved for a question
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub question: String,

    /// Number of chunks to retrieve (default: configured top-K)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let pipeline = AnswerPipeline::from_config(config)?;
        let results = pipeline.search_scored(&self.question, self.top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }

        if results.is_empty() {
            println!("No results");
            return Ok(());
        }

        for (rank, result) in results.iter().enumerate() {
            println!(
                "{}. {} (distance {:.4})",
                rank + 1,
                result.chunk.source,
                result.distance
            );
            println!("   {}", preview(&result.chunk.text));
        }

        Ok(())
    }
}

/// First line of `text`, shortened to [`MAX_PREVIEW_CHARS`].
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > MAX_PREVIEW_CHARS {
        let cut: String = line.chars().take(MAX_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_first_line() {
        assert_eq!(preview("first\nsecond"), "first");
        assert_eq!(preview(""), "");
    }

    #[test]
    fn test_preview_truncates_long_lines() {
        let long = "x".repeat(200);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), MAX_PREVIEW_CHARS + 3);
        assert!(shown.ends_with("..."));
    }
}
