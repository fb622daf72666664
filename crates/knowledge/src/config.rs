//! Knowledge base settings derived from the application config.

use grounded_core::AppConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Locations of the two persisted artifacts. Always read and written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Vector index artifact
    pub index: PathBuf,

    /// Chunk log artifact (JSON Lines)
    pub chunks: PathBuf,
}

impl ArtifactPaths {
    pub fn new(index: impl Into<PathBuf>, chunks: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            chunks: chunks.into(),
        }
    }

    /// Default artifact names inside a directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("index.bin"), dir.join("chunks.jsonl"))
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.index_path(), config.chunks_path())
    }

    /// Whether both artifacts are present on disk.
    pub fn exist(&self) -> bool {
        self.index.is_file() && self.chunks.is_file()
    }
}

/// Retrieval and generation knobs used by the answer pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalSettings {
    /// Nearest-neighbour candidates retrieved per question
    pub top_k: usize,

    /// Candidates placed in the prompt (never more than `top_k` are retrieved)
    pub top_m: usize,

    /// Generation model identifier
    pub model: String,

    /// Deadline for a whole answer call
    pub answer_timeout: Duration,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

impl RetrievalSettings {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.top_k,
            top_m: config.top_m,
            model: config.model.clone(),
            answer_timeout: config.answer_timeout(),
        }
    }

    /// Requested k, where `None` or zero means the configured top-K.
    pub fn resolve_k(&self, k: Option<usize>) -> usize {
        match k {
            Some(k) if k > 0 => k,
            _ => self.top_k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RetrievalSettings::default();
        assert_eq!(settings.top_k, 12);
        assert_eq!(settings.top_m, 6);
        assert_eq!(settings.answer_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_k() {
        let settings = RetrievalSettings::default();
        assert_eq!(settings.resolve_k(None), 12);
        assert_eq!(settings.resolve_k(Some(0)), 12);
        assert_eq!(settings.resolve_k(Some(3)), 3);
        assert_eq!(settings.resolve_k(Some(50)), 50);
    }

    #[test]
    fn test_artifact_paths_from_app_config() {
        let config = AppConfig {
            workspace: PathBuf::from("/srv/bot"),
            ..Default::default()
        };
        let paths = ArtifactPaths::from_app_config(&config);
        assert_eq!(paths.index, PathBuf::from("/srv/bot/.grounded/index.bin"));
        assert_eq!(paths.chunks, PathBuf::from("/srv/bot/.grounded/chunks.jsonl"));
        assert!(!paths.exist());
    }
}
