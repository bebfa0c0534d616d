//! Build-once cache for the vector index.
//!
//! Holds a single index for the process, keyed by corpus fingerprint and
//! embedder id. A key change or an explicit `invalidate` is the only way an
//! index gets rebuilt. Concurrent callers wait on the same build.

use anyhow::Result;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use docqa_core::CorpusFingerprint;

use crate::index::VectorIndex;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fingerprint: CorpusFingerprint,
    pub embedder_id: String,
}

#[derive(Default)]
pub struct IndexCache {
    slot: Mutex<Option<(CacheKey, Arc<VectorIndex>)>>,
    builds: AtomicUsize,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index for `key`, or run `build` and cache its result.
    /// A failed build leaves the previous entry in place.
    pub async fn get_or_build<F, Fut>(&self, key: CacheKey, build: F) -> Result<Arc<VectorIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VectorIndex>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some((cached_key, index)) = slot.as_ref() {
            if *cached_key == key {
                debug!(fingerprint = %key.fingerprint.short(), "Index cache hit");
                return Ok(Arc::clone(index));
            }
            info!(
                old = %cached_key.fingerprint.short(),
                new = %key.fingerprint.short(),
                "Corpus or embedder changed; rebuilding index"
            );
        }
        let index = Arc::new(build().await?);
        self.builds.fetch_add(1, Ordering::Relaxed);
        *slot = Some((key, Arc::clone(&index)));
        Ok(index)
    }

    /// Drop the cached index. Returns whether there was one.
    pub async fn invalidate(&self) -> bool {
        let dropped = self.slot.lock().await.take().is_some();
        if dropped {
            info!("Index cache invalidated");
        }
        dropped
    }

    pub async fn current(&self) -> Option<Arc<VectorIndex>> {
        self.slot.lock().await.as_ref().map(|(_, index)| Arc::clone(index))
    }

    /// Number of successful builds since this cache was created.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}
