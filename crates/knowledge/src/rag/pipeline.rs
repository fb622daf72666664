//! Question answering over the published knowledge base.
//!
//! Every failure on the answer path (no knowledge base, nothing retrieved,
//! generator error, blank generation, deadline) degrades to the fixed
//! fallback answer instead of an error.

use crate::config::{ArtifactPaths, RetrievalSettings};
use crate::embeddings::{Embedder, EmbeddingConfig};
use crate::handle::KnowledgeHandle;
use crate::ingest::ingest_and_persist;
use crate::knowledge_base::KnowledgeBase;
use crate::types::{Answer, Chunk, IngestStats, ScoredChunk};
use grounded_core::{AppConfig, AppError, AppResult};
use grounded_llm::{LlmClient, LlmRequest};
use grounded_prompt::{build_prompt, load_prompt, PromptDefinition};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// Generation provider used by [`AnswerPipeline::from_config`].
const GENERATION_PROVIDER: &str = "ollama";

/// Retrieval-augmented answering with a swappable knowledge base.
pub struct AnswerPipeline {
    embedder: Arc<Embedder>,
    generator: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    handle: KnowledgeHandle,
    settings: RetrievalSettings,
    paths: ArtifactPaths,
    reindex_lock: Mutex<()>,
}

impl AnswerPipeline {
    /// Create a pipeline with nothing published. Use [`Self::load_persisted`]
    /// or [`Self::reindex`] to make it ready.
    pub fn new(
        embedder: Arc<Embedder>,
        generator: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        settings: RetrievalSettings,
        paths: ArtifactPaths,
    ) -> Self {
        Self {
            embedder,
            generator,
            prompt,
            handle: KnowledgeHandle::empty(),
            settings,
            paths,
            reindex_lock: Mutex::new(()),
        }
    }

    /// Build every collaborator from the application config and load any
    /// persisted knowledge base.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let embedder = Embedder::from_config(&EmbeddingConfig::from_app_config(config))?;
        let generator = grounded_llm::create_client(
            GENERATION_PROVIDER,
            &config.endpoint,
            config.generate_timeout(),
        )?;
        let prompt = load_prompt(config.prompt_file().as_deref())?;

        let pipeline = Self::new(
            Arc::new(embedder),
            generator,
            prompt,
            RetrievalSettings::from_app_config(config),
            ArtifactPaths::from_app_config(config),
        );
        pipeline.load_persisted()?;

        Ok(pipeline)
    }

    /// Publish the knowledge base stored at the configured artifact paths.
    ///
    /// Returns `false` when no artifacts exist; the pipeline stays as it was.
    pub fn load_persisted(&self) -> AppResult<bool> {
        match KnowledgeBase::load(&self.paths)? {
            Some(kb) => {
                tracing::info!("Loaded knowledge base with {} chunks", kb.len());
                self.install(kb)?;
                Ok(true)
            }
            None => {
                tracing::info!("No knowledge base found; answering with fallback until reindexed");
                Ok(false)
            }
        }
    }

    pub fn handle(&self) -> &KnowledgeHandle {
        &self.handle
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// The currently published knowledge base.
    pub fn snapshot(&self) -> Option<Arc<KnowledgeBase>> {
        self.handle.snapshot()
    }

    pub fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    /// Ranked chunks for `question`. Empty when nothing is published.
    pub async fn search(&self, question: &str, k: Option<usize>) -> AppResult<Vec<Chunk>> {
        Ok(self
            .search_scored(question, k)
            .await?
            .into_iter()
            .map(|scored| scored.chunk)
            .collect())
    }

    /// Like [`Self::search`], keeping positions and distances.
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn search_scored(
        &self,
        question: &str,
        k: Option<usize>,
    ) -> AppResult<Vec<ScoredChunk>> {
        let Some(kb) = self.snapshot() else {
            return Ok(Vec::new());
        };
        self.search_in(&kb, question, k).await
    }

    /// Answer `question`. Never fails; see [`Answer::fallback`].
    pub async fn answer(&self, question: &str, k: Option<usize>) -> Answer {
        let deadline = self.settings.answer_timeout;

        match tokio::time::timeout(deadline, self.try_answer(question, k)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                tracing::warn!("Answer failed, using fallback: {}", e);
                Answer::fallback()
            }
            Err(_) => {
                tracing::warn!("Answer exceeded {:?} deadline, using fallback", deadline);
                Answer::fallback()
            }
        }
    }

    /// The answer path with failures reported as errors rather than fallbacks.
    ///
    /// Missing knowledge and empty retrieval are not errors: they return the
    /// fallback answer.
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn try_answer(&self, question: &str, k: Option<usize>) -> AppResult<Answer> {
        let Some(kb) = self.snapshot() else {
            tracing::debug!("No knowledge base published");
            return Ok(Answer::fallback());
        };

        let mut results = self.search_in(&kb, question, k).await?;
        if results.is_empty() {
            tracing::debug!("Nothing retrieved");
            return Ok(Answer::fallback());
        }

        results.truncate(self.settings.top_m);

        let passages: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        let prompt = build_prompt(&self.prompt, question, &passages)?;

        tracing::debug!(
            "Prompt built from {} passages ({} context bytes)",
            prompt.metadata.passage_count,
            prompt.metadata.context_bytes
        );

        let answer = self.generate(prompt.text).await?;
        let sources = results.into_iter().map(|r| r.chunk.source).collect();

        Ok(Answer { answer, sources })
    }

    /// Rebuild from `source_dir`, persist, and publish.
    ///
    /// Only one reindex runs at a time. On failure the previously published
    /// knowledge base stays in place.
    #[instrument(skip(self))]
    pub async fn reindex(&self, source_dir: &Path) -> AppResult<IngestStats> {
        let _guard = self.reindex_lock.lock().await;

        let (kb, stats) = ingest_and_persist(source_dir, &self.embedder, &self.paths).await?;
        self.install(kb)?;

        tracing::info!("Reindex published {} chunks", stats.files_count);
        Ok(stats)
    }

    async fn search_in(
        &self,
        kb: &KnowledgeBase,
        question: &str,
        k: Option<usize>,
    ) -> AppResult<Vec<ScoredChunk>> {
        let k = self.settings.resolve_k(k);
        let query = self.embedder.embed(question).await;
        let results = kb.search(&query, k)?;

        tracing::debug!("Retrieved {} of {} requested chunks", results.len(), k);
        Ok(results)
    }

    async fn generate(&self, prompt: String) -> AppResult<String> {
        let request = LlmRequest::new(prompt, &self.settings.model);
        let response = self.generator.complete(&request).await?;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(AppError::BackendUnavailable(format!(
                "{} returned an empty response",
                self.generator.provider_name()
            )));
        }

        Ok(text.to_string())
    }

    fn install(&self, kb: KnowledgeBase) -> AppResult<()> {
        if kb.dimension() != self.embedder.dimensions() {
            return Err(AppError::DimensionMismatch {
                expected: self.embedder.dimensions(),
                actual: kb.dimension(),
            });
        }
        self.handle.publish(kb);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{hash_embedding, EmbeddingProvider, HashProvider};
    use grounded_llm::LlmResponse;
    use grounded_prompt::FALLBACK_ANSWER;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tempfile::TempDir;

    const DIM: usize = 16;

    enum Behavior {
        Reply(&'static str),
        Fail,
        Hang,
    }

    struct StubGenerator {
        behavior: Behavior,
        prompts: StdMutex<Vec<String>>,
    }

    impl StubGenerator {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                prompts: StdMutex::new(Vec::new()),
            })
        }

        fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for StubGenerator {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            match self.behavior {
                Behavior::Reply(text) => Ok(LlmResponse {
                    content: text.to_string(),
                    model: request.model.clone(),
                }),
                Behavior::Fail => Err(AppError::BackendUnavailable("refused".to_string())),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(AppError::Other("unreachable".to_string()))
                }
            }
        }
    }

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn provider_name(&self) -> &str {
            "counting"
        }

        fn model_name(&self) -> &str {
            "counting"
        }

        fn dimensions(&self) -> usize {
            DIM
        }

        async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HashProvider::new(DIM).embed_sync(text))
        }
    }

    fn settings() -> RetrievalSettings {
        RetrievalSettings {
            top_k: 12,
            top_m: 6,
            model: "test-model".to_string(),
            answer_timeout: Duration::from_secs(5),
        }
    }

    fn pipeline_with(
        generator: Arc<StubGenerator>,
        settings: RetrievalSettings,
        dir: &Path,
    ) -> AnswerPipeline {
        AnswerPipeline::new(
            Arc::new(Embedder::offline(DIM).unwrap()),
            generator,
            PromptDefinition::default(),
            settings,
            ArtifactPaths::in_dir(&dir.join(".grounded")),
        )
    }

    /// Knowledge base of `n` chunks named `doc{i}.txt` with text `text {i}`.
    fn numbered_base(n: usize) -> KnowledgeBase {
        KnowledgeBase::from_pairs(
            DIM,
            (0..n).map(|i| {
                let text = format!("text {}", i);
                (
                    hash_embedding(&text, DIM),
                    Chunk::new(text, format!("doc{}.txt", i)),
                )
            }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_not_ready_returns_fallback_without_embedding() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(CountingProvider::default());
        let generator = StubGenerator::new(Behavior::Reply("should not be used"));

        let pipeline = AnswerPipeline::new(
            Arc::new(Embedder::new(provider.clone(), DIM).unwrap()),
            generator.clone(),
            PromptDefinition::default(),
            settings(),
            ArtifactPaths::in_dir(temp.path()),
        );

        assert!(!pipeline.is_ready());
        let answer = pipeline.answer("anything?", None).await;
        assert_eq!(answer.answer, FALLBACK_ANSWER);
        assert!(answer.sources.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(generator.last_prompt().is_none());

        assert!(pipeline.search("anything?", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_answer_uses_top_m_sources_in_rank_order() {
        let temp = TempDir::new().unwrap();
        let generator = StubGenerator::new(Behavior::Reply("  Forty two.\n"));
        let pipeline = pipeline_with(generator.clone(), settings(), temp.path());
        pipeline.handle().publish(numbered_base(10));

        let ranked = pipeline.search_scored("text 3", None).await.unwrap();
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].chunk.source, "doc3.txt");

        let answer = pipeline.answer("text 3", None).await;
        assert_eq!(answer.answer, "Forty two.");
        assert_eq!(answer.sources.len(), 6);

        let expected: Vec<String> = ranked
            .iter()
            .take(6)
            .map(|r| r.chunk.source.clone())
            .collect();
        assert_eq!(answer.sources, expected);

        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains("Context:"));
        assert!(prompt.contains("User question: text 3"));
        assert!(prompt.contains(&ranked[5].chunk.text));
        assert!(!prompt.contains(&ranked[6].chunk.text));
    }

    #[tokio::test]
    async fn test_k_override_limits_retrieval() {
        let temp = TempDir::new().unwrap();
        let pipeline =
            pipeline_with(StubGenerator::new(Behavior::Reply("ok")), settings(), temp.path());
        pipeline.handle().publish(numbered_base(10));

        assert_eq!(pipeline.search("q", Some(2)).await.unwrap().len(), 2);
        assert_eq!(pipeline.search("q", Some(0)).await.unwrap().len(), 10);

        let answer = pipeline.answer("q", Some(3)).await;
        assert_eq!(answer.sources.len(), 3);
    }

    #[tokio::test]
    async fn test_generator_failure_returns_fallback() {
        let temp = TempDir::new().unwrap();
        let pipeline = pipeline_with(StubGenerator::new(Behavior::Fail), settings(), temp.path());
        pipeline.handle().publish(numbered_base(3));

        let answer = pipeline.answer("text 1", None).await;
        assert!(answer.is_fallback());
        assert!(pipeline.try_answer("text 1", None).await.is_err());
    }

    #[tokio::test]
    async fn test_blank_generation_returns_fallback() {
        let temp = TempDir::new().unwrap();
        let pipeline =
            pipeline_with(StubGenerator::new(Behavior::Reply(" \n ")), settings(), temp.path());
        pipeline.handle().publish(numbered_base(3));

        let answer = pipeline.answer("text 1", None).await;
        assert_eq!(answer, Answer::fallback());
    }

    #[tokio::test]
    async fn test_deadline_returns_fallback() {
        let temp = TempDir::new().unwrap();
        let settings = RetrievalSettings {
            answer_timeout: Duration::from_millis(50),
            ..settings()
        };
        let pipeline = pipeline_with(StubGenerator::new(Behavior::Hang), settings, temp.path());
        pipeline.handle().publish(numbered_base(3));

        let answer = pipeline.answer("text 1", None).await;
        assert!(answer.is_fallback());
    }

    #[tokio::test]
    async fn test_reindex_publishes_and_persists() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("kb");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("hours.txt"), "Open 9 to 5.").unwrap();

        let generator = StubGenerator::new(Behavior::Reply("9 to 5"));
        let pipeline = pipeline_with(generator, settings(), temp.path());

        let stats = pipeline.reindex(&source).await.unwrap();
        assert_eq!(stats.files_count, 1);
        assert!(pipeline.is_ready());
        assert!(pipeline.paths().exist());

        let answer = pipeline.answer("When are you open?", None).await;
        assert_eq!(answer.answer, "9 to 5");
        assert_eq!(answer.sources, vec!["hours.txt".to_string()]);

        // A second pipeline over the same paths picks up the artifacts
        let reloaded =
            pipeline_with(StubGenerator::new(Behavior::Reply("x")), settings(), temp.path());
        assert!(reloaded.load_persisted().unwrap());
        assert_eq!(reloaded.snapshot().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reindex_swaps_for_new_requests_only() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("kb");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("a.txt"), "alpha").unwrap();
        std::fs::write(source.join("b.txt"), "bravo").unwrap();

        let pipeline =
            pipeline_with(StubGenerator::new(Behavior::Reply("ok")), settings(), temp.path());
        pipeline.handle().publish(numbered_base(5));

        let in_flight = pipeline.snapshot().unwrap();
        pipeline.reindex(&source).await.unwrap();

        assert_eq!(in_flight.len(), 5);
        assert_eq!(pipeline.snapshot().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_reindex_keeps_previous_base() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("empty");
        std::fs::create_dir_all(&empty).unwrap();

        let pipeline =
            pipeline_with(StubGenerator::new(Behavior::Reply("ok")), settings(), temp.path());
        pipeline.handle().publish(numbered_base(4));

        let result = pipeline.reindex(&empty).await;
        assert!(matches!(result, Err(AppError::EmptyCorpus { .. })));
        assert_eq!(pipeline.snapshot().unwrap().len(), 4);
        assert!(!pipeline.paths().exist());
    }

    #[tokio::test]
    async fn test_load_persisted_rejects_other_dimension() {
        let temp = TempDir::new().unwrap();
        let pipeline =
            pipeline_with(StubGenerator::new(Behavior::Reply("ok")), settings(), temp.path());

        assert!(!pipeline.load_persisted().unwrap());

        KnowledgeBase::from_pairs(4, vec![(vec![0.0; 4], Chunk::new("x", "x.txt"))])
            .unwrap()
            .save(pipeline.paths())
            .unwrap();

        assert!(matches!(
            pipeline.load_persisted(),
            Err(AppError::DimensionMismatch {
                expected: 16,
                actual: 4
            })
        ));
        assert!(!pipeline.is_ready());
    }
}
