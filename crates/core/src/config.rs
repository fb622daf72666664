//! Configuration management for grounded.
//!
//! Configuration is merged from, in increasing precedence:
//! - Built-in defaults
//! - The YAML config file (`.grounded/config.yaml` or `--config`)
//! - Environment variables
//! - Command-line flags
//!
//! Relative artifact and source paths are resolved against the workspace.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// The embedding providers grounded knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "hash"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .grounded/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Base URL of the Ollama-compatible inference server
    pub endpoint: String,

    /// Generation model identifier
    pub model: String,

    /// Embedding provider ("ollama" or "hash")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding dimension shared by the embedder and the index
    pub embedding_dim: usize,

    /// Nearest-neighbour candidates retrieved per question
    pub top_k: usize,

    /// Candidates actually placed in the prompt
    pub top_m: usize,

    /// Timeout for one embedding request, in seconds
    pub embed_timeout_secs: u64,

    /// Timeout for one generation request, in seconds
    pub generate_timeout_secs: u64,

    /// Deadline for a whole answer call, in seconds
    pub answer_timeout_secs: u64,

    /// Directory of source documents for ingestion
    pub source_dir: PathBuf,

    /// Index artifact path
    pub index_path: PathBuf,

    /// Chunk log artifact path
    pub chunks_path: PathBuf,

    /// Optional YAML prompt definition overriding the built-in template
    pub prompt_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    ollama: Option<OllamaSection>,
    embedding: Option<EmbeddingSection>,
    retrieval: Option<RetrievalSection>,
    knowledge: Option<KnowledgeSection>,
    prompt: Option<PromptSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OllamaSection {
    endpoint: Option<String>,
    model: Option<String>,
    embed_timeout_secs: Option<u64>,
    generate_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalSection {
    top_k: Option<usize>,
    top_m: Option<usize>,
    answer_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeSection {
    source_dir: Option<PathBuf>,
    index_path: Option<PathBuf>,
    chunks_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PromptSection {
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.1:8b-instruct".to_string(),
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            top_k: 12,
            top_m: 6,
            embed_timeout_secs: 5,
            generate_timeout_secs: 15,
            answer_timeout_secs: 30,
            source_dir: PathBuf::from("kb"),
            index_path: PathBuf::from(".grounded/index.bin"),
            chunks_path: PathBuf::from(".grounded/chunks.jsonl"),
            prompt_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, the config file and defaults.
    ///
    /// Environment variables:
    /// - `GROUNDED_WORKSPACE`: Override workspace path
    /// - `GROUNDED_CONFIG`: Path to config file
    /// - `OLLAMA_URL`: Inference server base URL
    /// - `GROUNDED_MODEL`, `GROUNDED_EMBED_MODEL`, `GROUNDED_EMBED_PROVIDER`
    /// - `GROUNDED_EMBED_DIM`, `GROUNDED_TOP_K`, `GROUNDED_TOP_M`
    /// - `GROUNDED_KB_DIR`, `GROUNDED_INDEX_PATH`, `GROUNDED_CHUNKS_PATH`
    /// - `NO_COLOR`
    ///
    /// `RUST_LOG` is not read here; the logging filter falls back to it when
    /// no level is configured.
    ///
    /// # Example
    /// ```no_run
    /// use grounded_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and/or config file.
    ///
    /// Explicit arguments win over `GROUNDED_WORKSPACE` and `GROUNDED_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("GROUNDED_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("GROUNDED_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.grounded_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env()?;

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);
        Ok(self.merge_file(file))
    }

    fn merge_file(&self, file: ConfigFile) -> Self {
        let mut result = self.clone();

        if let Some(ollama) = file.ollama {
            merge(&mut result.endpoint, ollama.endpoint);
            merge(&mut result.model, ollama.model);
            merge(&mut result.embed_timeout_secs, ollama.embed_timeout_secs);
            merge(&mut result.generate_timeout_secs, ollama.generate_timeout_secs);
        }

        if let Some(embedding) = file.embedding {
            merge(&mut result.embedding_provider, embedding.provider);
            merge(&mut result.embedding_model, embedding.model);
            merge(&mut result.embedding_dim, embedding.dimensions);
        }

        if let Some(retrieval) = file.retrieval {
            merge(&mut result.top_k, retrieval.top_k);
            merge(&mut result.top_m, retrieval.top_m);
            merge(&mut result.answer_timeout_secs, retrieval.answer_timeout_secs);
        }

        if let Some(knowledge) = file.knowledge {
            merge(&mut result.source_dir, knowledge.source_dir);
            merge(&mut result.index_path, knowledge.index_path);
            merge(&mut result.chunks_path, knowledge.chunks_path);
        }

        if let Some(prompt) = file.prompt {
            if prompt.file.is_some() {
                result.prompt_file = prompt.file;
            }
        }

        if let Some(logging) = file.logging {
            if logging.level.is_some() {
                result.log_level = logging.level;
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            merge(&mut result.log_json, logging.json);
        }

        result
    }

    /// Environment variables override the YAML config.
    fn apply_env(&mut self) -> AppResult<()> {
        merge(&mut self.endpoint, std::env::var("OLLAMA_URL").ok());
        merge(&mut self.model, std::env::var("GROUNDED_MODEL").ok());
        merge(
            &mut self.embedding_provider,
            std::env::var("GROUNDED_EMBED_PROVIDER").ok(),
        );
        merge(
            &mut self.embedding_model,
            std::env::var("GROUNDED_EMBED_MODEL").ok(),
        );
        merge(&mut self.embedding_dim, env_parse("GROUNDED_EMBED_DIM")?);
        merge(&mut self.top_k, env_parse("GROUNDED_TOP_K")?);
        merge(&mut self.top_m, env_parse("GROUNDED_TOP_M")?);
        merge(&mut self.source_dir, env_path("GROUNDED_KB_DIR"));
        merge(&mut self.index_path, env_path("GROUNDED_INDEX_PATH"));
        merge(&mut self.chunks_path, env_path("GROUNDED_CHUNKS_PATH"));

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        endpoint: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        merge(&mut self.endpoint, endpoint);
        merge(&mut self.model, model);

        if log_level.is_some() {
            self.log_level = log_level;
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        self.no_color |= no_color;
        self.log_json |= log_json;

        self
    }

    /// Get the path to the .grounded directory.
    pub fn grounded_dir(&self) -> PathBuf {
        self.workspace.join(".grounded")
    }

    /// Resolve a possibly relative path against the workspace.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Absolute source directory for ingestion.
    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.source_dir)
    }

    /// Absolute index artifact path.
    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.index_path)
    }

    /// Absolute chunk log path.
    pub fn chunks_path(&self) -> PathBuf {
        self.resolve(&self.chunks_path)
    }

    /// Absolute prompt definition path, if one is configured.
    pub fn prompt_file(&self) -> Option<PathBuf> {
        self.prompt_file.as_deref().map(|p| self.resolve(p))
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }

    pub fn answer_timeout(&self) -> Duration {
        Duration::from_secs(self.answer_timeout_secs)
    }

    /// Validate value ranges and provider names.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding_dim == 0 {
            return Err(AppError::Config(
                "Embedding dimension must be greater than zero".to_string(),
            ));
        }

        if self.top_k == 0 || self.top_m == 0 {
            return Err(AppError::Config(
                "topK and topM must be greater than zero".to_string(),
            ));
        }

        if self.top_m > self.top_k {
            return Err(AppError::Config(format!(
                "topM ({}) must not exceed topK ({})",
                self.top_m, self.top_k
            )));
        }

        if self.embed_timeout_secs == 0
            || self.generate_timeout_secs == 0
            || self.answer_timeout_secs == 0
        {
            return Err(AppError::Config(
                "Timeouts must be at least one second".to_string(),
            ));
        }

        if self.endpoint.trim().is_empty() {
            return Err(AppError::Config("Endpoint cannot be empty".to_string()));
        }

        Ok(())
    }
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().map(PathBuf::from)
}

fn env_parse<T: FromStr>(key: &str) -> AppResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model, "llama3.1:8b-instruct");
        assert_eq!(config.embedding_model, "nomic-embed-text");
        assert_eq!(config.embedding_dim, 768);
        assert_eq!(config.top_k, 12);
        assert_eq!(config.top_m, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_paths_resolve_against_workspace() {
        let config = AppConfig {
            workspace: PathBuf::from("/srv/bot"),
            ..Default::default()
        };
        assert_eq!(config.source_dir(), PathBuf::from("/srv/bot/kb"));
        assert_eq!(config.index_path(), PathBuf::from("/srv/bot/.grounded/index.bin"));
        assert_eq!(
            config.chunks_path(),
            PathBuf::from("/srv/bot/.grounded/chunks.jsonl")
        );
        assert_eq!(
            config.resolve(Path::new("/abs/kb")),
            PathBuf::from("/abs/kb")
        );
    }

    #[test]
    fn test_merge_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
ollama:
  endpoint: http://gpu-box:11434
  generateTimeoutSecs: 40
embedding:
  provider: hash
  dimensions: 256
retrieval:
  topK: 8
  topM: 3
knowledge:
  sourceDir: docs
prompt:
  file: prompts/answer.yml
logging:
  color: false
"#,
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.endpoint, "http://gpu-box:11434");
        assert_eq!(config.generate_timeout_secs, 40);
        assert_eq!(config.embed_timeout_secs, 5);
        assert_eq!(config.embedding_provider, "hash");
        assert_eq!(config.embedding_dim, 256);
        assert_eq!(config.top_k, 8);
        assert_eq!(config.top_m, 3);
        assert_eq!(config.source_dir, PathBuf::from("docs"));
        assert_eq!(config.prompt_file, Some(PathBuf::from("prompts/answer.yml")));
        assert!(config.no_color);
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "retrieval: [unclosed").unwrap();
        assert!(AppConfig::default().merge_yaml(&path).is_err());
    }

    #[test]
    fn test_load_from_missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_from(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("absent.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some("http://other:11434".to_string()),
            Some("mistral".to_string()),
            None,
            true,
            false,
            true,
        );

        assert_eq!(config.endpoint, "http://other:11434");
        assert_eq!(config.model, "mistral");
        assert!(config.verbose);
        assert!(config.log_json);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_rust_log_leaves_verbose_in_charge() {
        std::env::set_var("RUST_LOG", "warn");
        let mut config = AppConfig::default();
        let applied = config.apply_env();
        std::env::remove_var("RUST_LOG");

        applied.unwrap();
        assert_eq!(config.log_level, None);

        let config = config.with_overrides(None, None, None, true, false, false);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_top_m_exceeds_top_k() {
        let config = AppConfig {
            top_k: 4,
            top_m: 6,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig {
            embedding_provider: "word2vec".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_dimension() {
        let config = AppConfig {
            embedding_dim: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
