use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use docqa_core::config::{AppConfig, CorpusConfig, HistoryPolicy};
use docqa_core::error::Error;
use docqa_core::traits::{ChatModel, Embedder};
use docqa_core::types::{Answer, Citation, Exchange};
use docqa_core::{Chunker, ChunkingConfig, CorpusFingerprint, CorpusLoader};
use docqa_vector::{CacheKey, IndexCache, VectorIndex};

use crate::prompt::{answer_messages, condense_messages};

/// Settings the chain needs, split out of [`AppConfig`] so tests can build
/// one directly.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub corpus: CorpusConfig,
    pub chunking: ChunkingConfig,
    /// Chunks retrieved per question.
    pub k: usize,
    pub temperature: f32,
    pub history: HistoryPolicy,
}

impl PipelineConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            corpus: config.corpus.clone(),
            chunking: config.chunking,
            k: config.retrieval.k,
            temperature: config.openai.temperature,
            history: config.history.policy,
        }
    }
}

pub struct RagPipeline {
    loader: CorpusLoader,
    chunker: Chunker,
    k: usize,
    temperature: f32,
    history: HistoryPolicy,
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    cache: Arc<IndexCache>,
}

impl RagPipeline {
    pub fn new(
        config: PipelineConfig,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        cache: Arc<IndexCache>,
    ) -> Result<Self> {
        if config.k == 0 {
            return Err(Error::InvalidConfig("retrieval.k must be >= 1".into()).into());
        }
        Ok(Self {
            loader: CorpusLoader::from_config(&config.corpus)?,
            chunker: Chunker::new(config.chunking)?,
            k: config.k,
            temperature: config.temperature,
            history: config.history,
            embedder,
            chat,
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<IndexCache> {
        &self.cache
    }

    /// Load the corpus and return the index for its current contents,
    /// building it only when the cache holds none for this fingerprint and
    /// embedder.
    pub async fn index(&self) -> Result<Arc<VectorIndex>> {
        let loader = self.loader.clone();
        let docs = tokio::task::spawn_blocking(move || loader.load())
            .await
            .context("Corpus loading task failed")??;
        let fingerprint = CorpusFingerprint::of(&docs);
        let key = CacheKey { fingerprint, embedder_id: self.embedder.embedder_id().to_string() };

        let chunker = &self.chunker;
        let embedder = Arc::clone(&self.embedder);
        self.cache
            .get_or_build(key, || async move {
                let chunks = chunker.chunk_all(&docs);
                info!(documents = docs.len(), chunks = chunks.len(), "Chunked corpus");
                VectorIndex::build(chunks, embedder.as_ref(), fingerprint).await
            })
            .await
    }

    /// Nearest `k` chunks to `question`. An empty index returns nothing
    /// without embedding the question.
    pub async fn retrieve(&self, index: &VectorIndex, question: &str) -> Result<Vec<Citation>> {
        if index.is_empty() {
            debug!("Index is empty; skipping retrieval");
            return Ok(Vec::new());
        }
        let query = self
            .embedder
            .embed_query(question)
            .await
            .context("Failed to embed question")?;
        index.search(&query, self.k)
    }

    /// The question retrieval and answering run on. Earlier turns only
    /// matter under [`HistoryPolicy::Condense`].
    pub async fn standalone_question(&self, question: &str, history: &[Exchange]) -> Result<String> {
        if self.history == HistoryPolicy::Discard || history.is_empty() {
            return Ok(question.to_string());
        }
        let rewritten = self
            .chat
            .complete(&condense_messages(question, history), self.temperature)
            .await?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            return Ok(question.to_string());
        }
        debug!(original = question, standalone = rewritten, "Condensed follow-up question");
        Ok(rewritten.to_string())
    }

    pub async fn answer(&self, question: &str, history: &[Exchange]) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::Operation("question must not be empty".into()).into());
        }
        let started = Instant::now();

        let index = self.index().await?;
        let standalone = self.standalone_question(question, history).await?;
        let sources = self.retrieve(&index, &standalone).await?;
        let messages = answer_messages(&standalone, &sources);
        let answer = self.chat.complete(&messages, self.temperature).await?;

        info!(
            sources = sources.len(),
            model = self.chat.model_id(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Answered question"
        );
        Ok(Answer { answer: answer.trim().to_string(), sources })
    }
}
