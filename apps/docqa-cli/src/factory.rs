use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use docqa_chain::{OpenAiChat, PipelineConfig, RagPipeline};
use docqa_core::traits::Embedder;
use docqa_core::{ApiKey, AppConfig};
use docqa_embed::{use_fake_embeddings, FakeEmbedder, OpenAiEmbedder, FAKE_EMBEDDING_DIM};
use docqa_vector::IndexCache;

/// Builds a pipeline for one request's API key. Every pipeline from one
/// factory shares the same index cache.
pub trait PipelineFactory: Send + Sync {
    fn pipeline(&self, api_key: &ApiKey) -> Result<RagPipeline>;
}

pub struct OpenAiPipelineFactory {
    config: AppConfig,
    cache: Arc<IndexCache>,
    client: reqwest::Client,
}

impl OpenAiPipelineFactory {
    pub fn new(config: AppConfig, cache: Arc<IndexCache>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.openai.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, cache, client })
    }
}

impl PipelineFactory for OpenAiPipelineFactory {
    fn pipeline(&self, api_key: &ApiKey) -> Result<RagPipeline> {
        let openai = &self.config.openai;
        let embedder: Arc<dyn Embedder> = if use_fake_embeddings(openai) {
            Arc::new(FakeEmbedder::new(FAKE_EMBEDDING_DIM))
        } else {
            Arc::new(OpenAiEmbedder::with_client(self.client.clone(), openai, api_key.clone()))
        };
        let chat = Arc::new(OpenAiChat::with_client(self.client.clone(), openai, api_key.clone()));
        RagPipeline::new(
            PipelineConfig::from_app(&self.config),
            embedder,
            chat,
            Arc::clone(&self.cache),
        )
    }
}
