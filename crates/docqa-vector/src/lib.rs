//! docqa-vector
//!
//! In-memory exact nearest-neighbour index over chunk embeddings, and the
//! process-wide cache that keeps one built index per corpus fingerprint.

pub mod cache;
pub mod index;

pub use cache::{CacheKey, IndexCache};
pub use index::{cosine_similarity, VectorIndex};
