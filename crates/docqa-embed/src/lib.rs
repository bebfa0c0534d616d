//! Embedding providers: the OpenAI-compatible embeddings API and a
//! deterministic offline embedder for tests and development.
//!
//! `APP_USE_FAKE_EMBEDDINGS=1` (or `openai.fake_embeddings = true`) switches
//! to the offline embedder.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use docqa_core::config::OpenAiConfig;
use docqa_core::error::Error;
use docqa_core::traits::Embedder;
use docqa_core::ApiKey;

mod fake;
mod openai;

pub use fake::{FakeEmbedder, FAKE_EMBEDDING_DIM};
pub use openai::OpenAiEmbedder;

pub fn use_fake_embeddings(config: &OpenAiConfig) -> bool {
    config.fake_embeddings
        || std::env::var("APP_USE_FAKE_EMBEDDINGS")
            .ok()
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Pick the embedder for this configuration. The API key is only required
/// when the remote embedder is selected.
pub fn get_default_embedder(config: &OpenAiConfig, api_key: Option<&ApiKey>) -> Result<Arc<dyn Embedder>> {
    if use_fake_embeddings(config) {
        info!("Using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(FAKE_EMBEDDING_DIM)));
    }
    let api_key = api_key.ok_or(Error::MissingCredential)?;
    Ok(Arc::new(OpenAiEmbedder::new(config, api_key.clone())?))
}
