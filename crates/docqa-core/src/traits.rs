use async_trait::async_trait;

use crate::types::ChatMessage;

/// Turns text into fixed-dimension vectors. Vectors from one `embedder_id`
/// must share the same dimension.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-ada-002:d1536`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    /// Embed a batch of texts; output order matches input order.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector for the query"))
    }
}

/// A chat-completion language model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_id(&self) -> &str;
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> anyhow::Result<String>;
}
