use anyhow::{anyhow, ensure, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, Citation};
use docqa_core::CorpusFingerprint;

struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Flat index: every query is scored against every chunk. Built once,
/// read-only afterwards.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dim: usize,
    embedder_id: String,
    fingerprint: CorpusFingerprint,
    built_at: DateTime<Utc>,
}

impl VectorIndex {
    /// Embed all chunk texts in one `embed_batch` call and index them.
    /// No chunks means no embedder call and an empty index.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        fingerprint: CorpusFingerprint,
    ) -> Result<Self> {
        let dim = embedder.dim();
        if chunks.is_empty() {
            info!(fingerprint = %fingerprint.short(), "Corpus is empty; built an empty index");
            return Ok(Self::empty(fingerprint, embedder.embedder_id(), dim));
        }

        let start = Instant::now();
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(anyhow!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            ));
        }
        let mut entries = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            ensure!(
                vector.len() == dim,
                "dim mismatch for {}: got {} expected {}",
                chunk.id,
                vector.len(),
                dim
            );
            entries.push(IndexEntry { chunk, vector });
        }

        info!(
            chunks = entries.len(),
            dim,
            embedder = embedder.embedder_id(),
            fingerprint = %fingerprint.short(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built vector index"
        );
        Ok(Self {
            entries,
            dim,
            embedder_id: embedder.embedder_id().to_string(),
            fingerprint,
            built_at: Utc::now(),
        })
    }

    pub fn empty(fingerprint: CorpusFingerprint, embedder_id: &str, dim: usize) -> Self {
        Self {
            entries: Vec::new(),
            dim,
            embedder_id: embedder_id.to_string(),
            fingerprint,
            built_at: Utc::now(),
        }
    }

    /// Top-`k` chunks by cosine similarity, best first. Equal scores keep
    /// corpus order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Citation>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        ensure!(
            query.len() == self.dim,
            "query dim mismatch: got {} expected {}",
            query.len(),
            self.dim
        );
        // Overflowing norms give NaN; such chunks are never returned.
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, &e.vector)))
            .filter(|(_, score)| !score.is_nan())
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        debug!(hits = scored.len(), best = ?scored.first().map(|s| s.1), "Vector search");
        Ok(scored
            .into_iter()
            .map(|(i, score)| Citation { chunk: self.entries[i].chunk.clone(), score })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    pub fn fingerprint(&self) -> CorpusFingerprint {
        self.fingerprint
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

impl fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorIndex")
            .field("len", &self.entries.len())
            .field("dim", &self.dim)
            .field("embedder_id", &self.embedder_id)
            .field("fingerprint", &self.fingerprint.short())
            .finish()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
