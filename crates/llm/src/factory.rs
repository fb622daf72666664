//! Generation client factory.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use grounded_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a generation client by provider name.
///
/// # Arguments
/// * `provider` - Provider identifier (currently only "ollama")
/// * `endpoint` - Base URL of the inference server
/// * `timeout` - Per-request timeout
///
/// # Errors
/// Returns `AppError::Config` for unknown providers or if the HTTP client
/// cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: &str,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let client = OllamaClient::with_base_url(endpoint, timeout)?;
            tracing::debug!("Created Ollama generation client for {}", endpoint);
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown generation provider: {}. Supported: ollama",
            provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", "http://localhost:11434", Duration::from_secs(15));
        assert_eq!(client.unwrap().provider_name(), "ollama");
    }

    #[test]
    fn test_provider_name_is_case_insensitive() {
        assert!(create_client("Ollama", "http://localhost:8080", Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("openai", "http://localhost", Duration::from_secs(1)) {
            Err(err) => assert!(err.to_string().contains("Unknown generation provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
