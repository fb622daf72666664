//! Generation backend crate for grounded.
//!
//! Provides a provider-agnostic [`LlmClient`] trait and an Ollama
//! implementation used by the answer pipeline.
//!
//! # Example
//! ```no_run
//! use grounded_llm::{LlmClient, LlmRequest, OllamaClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::with_base_url("http://localhost:11434", Duration::from_secs(15))?;
//! let request = LlmRequest::new("Hello, world!", "llama3.1:8b-instruct");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse};
pub use factory::create_client;
pub use providers::OllamaClient;
