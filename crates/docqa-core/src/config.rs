//! Typed configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_SERVER__PORT=9000`). `RUST_ENV` selects the profile file.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::error::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub corpus: CorpusConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub openai: OpenAiConfig,
    pub server: ServerConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub dir: String,
    pub glob: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self { dir: "./documents".to_string(), glob: "*.txt".to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the model per question.
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub chat_model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Maximum texts per embeddings request.
    pub max_batch_size: usize,
    /// Use the deterministic offline embedder instead of the embeddings API.
    pub fake_embeddings: bool,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            embedding_dim: 1536,
            chat_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            timeout_secs: 60,
            max_batch_size: 1000,
            fake_embeddings: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8501 }
    }
}

/// What the answering chain does with earlier turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// Every question is answered on its own; history is ignored.
    #[default]
    Discard,
    /// Follow-up questions are rewritten into standalone questions first.
    Condense,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub policy: HistoryPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl AppConfig {
    /// Load with config files looked up in `base`.
    pub fn load_from(base: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(base.join("config.toml")));
        if let Some(profile) = profile_file(env_name) {
            figment = figment.merge(Toml::file(base.join(profile)));
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config: AppConfig = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        self.chunking.validate()?;
        if self.retrieval.k == 0 {
            return Err(Error::InvalidConfig("retrieval.k must be >= 1".into()));
        }
        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(Error::InvalidConfig(format!(
                "openai.temperature must be within 0..=2, got {}",
                self.openai.temperature
            )));
        }
        if self.openai.max_batch_size == 0 {
            return Err(Error::InvalidConfig("openai.max_batch_size must be >= 1".into()));
        }
        if self.corpus.glob.trim().is_empty() {
            return Err(Error::InvalidConfig("corpus.glob must not be empty".into()));
        }
        Ok(())
    }
}

fn profile_file(env_name: &str) -> Option<&'static str> {
    match env_name {
        "dev" | "development" => Some("config.dev.toml"),
        "prod" | "production" => Some("config.prod.toml"),
        "test" | "testing" => Some("config.test.toml"),
        _ => None,
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

