//! OpenAI chat-completions client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use docqa_core::config::OpenAiConfig;
use docqa_core::error::Error;
use docqa_core::traits::ChatModel;
use docqa_core::types::ChatMessage;
use docqa_core::ApiKey;

pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: ApiKey,
}

impl OpenAiChat {
    pub fn new(config: &OpenAiConfig, api_key: ApiKey) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client, config, api_key))
    }

    pub fn with_client(client: reqwest::Client, config: &OpenAiConfig, api_key: ApiKey) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.chat_model.clone(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest { model: &self.model, messages, temperature };
        debug!(model = %self.model, messages = messages.len(), temperature, "Requesting chat completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Chat request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(Error::Provider { status: status.as_u16(), body }.into());
        }

        let result: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;
        result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Operation("chat completion returned no content".into()).into())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
