//! Domain types passed between the loader, chunker, index and answering chain.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub type ChunkId = String;

/// A loaded source file. Never modified after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub content: String,
}

impl Document {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self { source: source.into(), content: content.into() }
    }

    /// File name of the source path, used as the prefix of chunk ids.
    pub fn doc_id(&self) -> String {
        Path::new(&self.source)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.clone())
    }
}

/// A window of a document's text that is embedded and retrieved on its own.
///
/// - `id`: `<file name>:<chunk_index>`
/// - `source`: path of the parent document, shown as the citation origin
/// - `start_char`: offset of the window in the parent, in characters
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub source: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub start_char: usize,
}

impl Chunk {
    /// The first `max_chars` characters of the chunk text.
    pub fn snippet(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => &self.content[..byte_idx],
            None => &self.content,
        }
    }
}

/// A retrieved chunk together with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub chunk: Chunk,
    pub score: f32,
}

/// Result of one question: model text plus the chunks it was given, in
/// retrieval order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<Citation>,
}

/// One earlier question/answer turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message in the shape OpenAI-compatible chat endpoints accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}
