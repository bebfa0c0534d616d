//! Fixed-size character windows with overlap.
//!
//! Sizes are measured in Unicode scalar values, never bytes, so multi-byte
//! text is never split inside a character. Windows ignore sentence and word
//! boundaries.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Distance between the starts of consecutive windows.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn chunk(&self, doc: &Document) -> Vec<Chunk> {
        let windows = self.windows(&doc.content);
        let total_chunks = windows.len();
        let doc_id = doc.doc_id();
        windows
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (start_char, text))| Chunk {
                id: format!("{doc_id}:{chunk_index}"),
                source: doc.source.clone(),
                content: text.to_string(),
                chunk_index,
                total_chunks,
                start_char,
            })
            .collect()
    }

    pub fn chunk_all(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter().flat_map(|doc| self.chunk(doc)).collect()
    }

    fn windows<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        // Byte offset of every character start, plus the end of the text.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = bounds.len() - 1;
        if char_count == 0 {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.config.chunk_size).min(char_count);
            out.push((start, &text[bounds[start]..bounds[end]]));
            if end == char_count {
                break;
            }
            start += self.config.stride();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(ChunkingConfig { chunk_size: size, chunk_overlap: overlap }).expect("valid config")
    }

    #[test]
    fn short_document_is_single_chunk() {
        let chunks = chunker(1000, 200).chunk(&Document::new("a.txt", "Short text"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Short text");
        assert_eq!(chunks[0].id, "a.txt:0");
        assert_eq!(chunks[0].total_chunks, 1);
    }

    #[test]
    fn empty_document_has_no_chunks() {
        assert!(chunker(1000, 200).chunk(&Document::new("a.txt", "")).is_empty());
    }

    #[test]
    fn windows_advance_by_stride() {
        let text: String = "abcdefghij".repeat(3);
        let chunks = chunker(10, 4).chunk(&Document::new("a.txt", text.clone()));
        let starts: Vec<usize> = chunks.iter().map(|c| c.start_char).collect();
        assert_eq!(starts, vec![0, 6, 12, 18, 24]);
        assert_eq!(chunks.last().map(|c| c.start_char + c.content.chars().count()), Some(30));
    }

    #[test]
    fn multibyte_text_is_split_on_characters() {
        let text: String = "한국어".repeat(500);
        let chunks = chunker(1000, 200).chunk(&Document::new("k.txt", text));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content.chars().count(), 1000);
        assert_eq!(chunks[1].content.chars().count(), 700);
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        assert!(Chunker::new(ChunkingConfig { chunk_size: 100, chunk_overlap: 100 }).is_err());
        assert!(Chunker::new(ChunkingConfig { chunk_size: 0, chunk_overlap: 0 }).is_err());
    }
}
