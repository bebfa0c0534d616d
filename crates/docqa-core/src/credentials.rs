//! API key handling.
//!
//! Keys are passed explicitly into the clients that need them; nothing here
//! writes to the process environment. Obvious placeholders are rejected up
//! front so a bad key never reaches the network.

use std::fmt;

use crate::error::{Error, Result};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const PLACEHOLDERS: &[&str] = &[
    "your-api-key",
    "your_api_key",
    "your-openai-api-key",
    "your_openai_api_key",
    "<your-key>",
    "<api-key>",
    "api-key",
    "changeme",
    "placeholder",
    "todo",
];

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn parse(raw: &str) -> Result<Self> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(Error::MissingCredential);
        }
        if looks_like_placeholder(key) {
            return Err(Error::InvalidCredential(format!(
                "'{}' looks like a placeholder, not a real API key",
                redact(key)
            )));
        }
        Ok(Self(key.to_string()))
    }

    /// The raw key, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&redact(&self.0)).finish()
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(&self.0))
    }
}

fn looks_like_placeholder(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    if PLACEHOLDERS.contains(&lower.as_str()) {
        return true;
    }
    if lower.contains("your") && lower.contains("key") {
        return true;
    }
    if key.chars().any(char::is_whitespace) {
        return true;
    }
    // "sk-", "sk-...", "sk-xxxxxxxx", "sk-****"
    let body = lower.strip_prefix("sk-").unwrap_or(&lower);
    body.chars().all(|c| matches!(c, 'x' | '.' | '*'))
}

fn redact(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("…{tail}")
}

/// Resolve the key from an explicit value, the configured value, then
/// `OPENAI_API_KEY`. The first non-blank candidate wins and is validated.
pub fn resolve_api_key(explicit: Option<&str>, configured: Option<&str>) -> Result<ApiKey> {
    let from_env = std::env::var(API_KEY_ENV).ok();
    resolve_from(explicit, configured, from_env.as_deref())
}

pub fn resolve_from(
    explicit: Option<&str>,
    configured: Option<&str>,
    from_env: Option<&str>,
) -> Result<ApiKey> {
    [explicit, configured, from_env]
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.trim().is_empty())
        .map_or(Err(Error::MissingCredential), ApiKey::parse)
}
