//! docqa-core
//!
//! Domain types, configuration, corpus loading and chunking shared by the
//! embedding, vector and answering crates.

pub mod chunker;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fingerprint;
pub mod loader;
pub mod logging;
pub mod traits;
pub mod types;

pub use chunker::{Chunker, ChunkingConfig};
pub use config::AppConfig;
pub use credentials::ApiKey;
pub use error::{Error, Result};
pub use fingerprint::CorpusFingerprint;
pub use loader::CorpusLoader;
