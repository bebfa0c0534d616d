//! OpenAI embedding provider.
//!
//! Talks to `{base_url}/embeddings`; works with any OpenAI-compatible server.
//! Inputs are split into requests of at most `max_batch_size` texts. Failures
//! are returned as-is: no retries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use docqa_core::config::OpenAiConfig;
use docqa_core::error::Error;
use docqa_core::traits::Embedder;
use docqa_core::ApiKey;

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dim: usize,
    max_batch_size: usize,
    api_key: ApiKey,
    id: String,
}

impl OpenAiEmbedder {
    pub fn new(config: &OpenAiConfig, api_key: ApiKey) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client, config, api_key))
    }

    /// Reuse an existing client (and its connection pool).
    pub fn with_client(client: reqwest::Client, config: &OpenAiConfig, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
            dim: config.embedding_dim,
            max_batch_size: config.max_batch_size.max(1),
            api_key,
            id: format!("openai:{}:d{}", config.embedding_model, config.embedding_dim),
        }
    }

    async fn call_embeddings_api(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = EmbeddingsRequest { model: &self.model, input: texts };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Embedding request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(Error::Provider { status: status.as_u16(), body }.into());
        }

        let result: EmbeddingsResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        let mut data = result.data;
        data.sort_by_key(|d| d.index);
        if data.len() != texts.len() {
            anyhow::bail!("embedder returned {} vectors for {} inputs", data.len(), texts.len());
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.max_batch_size) {
            debug!(model = %self.model, batch = batch.len(), "Requesting embeddings");
            out.extend(self.call_embeddings_api(batch).await?);
        }
        Ok(out)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
