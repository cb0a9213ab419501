//! Per-user in-memory vector index.
//!
//! A [`VectorIndex`] holds the embedded chunks of one user's memory corpus
//! and answers cosine nearest-neighbor queries. Indices live behind
//! [`IndexCache`], a bounded LRU keyed by user id — a pure performance
//! cache, never a source of truth: the raw memory rows stay authoritative
//! and any index can be rebuilt from them at any time.

pub mod chunker;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

/// One embedded fragment of a user's memory corpus. The text carries its
/// source-kind prefix from index build time.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub text: String,
    pub vector: Vec<f32>,
}

/// A nearest-neighbor hit.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub text: String,
    pub similarity: f32,
}

/// Immutable snapshot of one user's embedded chunks.
#[derive(Debug, Default)]
pub struct VectorIndex {
    chunks: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn new(chunks: Vec<IndexedChunk>) -> Self {
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top-`k` chunks by cosine similarity to the query vector.
    ///
    /// Ties are broken by insertion order (stable sort), so results are
    /// deterministic for a fixed corpus snapshot.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(query, &chunk.vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(i, similarity)| SearchHit {
                text: self.chunks[i].text.clone(),
                similarity,
            })
            .collect()
    }

    /// A new index with `extra` chunks appended. Supports incremental upsert
    /// without touching existing vectors.
    pub fn with_appended(&self, extra: Vec<IndexedChunk>) -> Self {
        let mut chunks = self.chunks.clone();
        chunks.extend(extra);
        Self { chunks }
    }
}

/// Cosine similarity in `[-1, 1]`; zero vectors or mismatched lengths
/// score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Bounded LRU cache of per-user vector indices.
pub struct IndexCache {
    inner: Mutex<LruCache<String, Arc<VectorIndex>>>,
}

impl IndexCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, user_id: &str) -> Option<Arc<VectorIndex>> {
        self.inner
            .lock()
            .expect("index cache lock poisoned")
            .get(user_id)
            .cloned()
    }

    pub fn insert(&self, user_id: &str, index: Arc<VectorIndex>) {
        self.inner
            .lock()
            .expect("index cache lock poisoned")
            .put(user_id.to_string(), index);
    }

    /// Drop a user's index. Called on memory deletion and forced rebuilds.
    pub fn evict(&self, user_id: &str) {
        self.inner
            .lock()
            .expect("index cache lock poisoned")
            .pop(user_id);
    }

    /// Append freshly embedded chunks to a cached index, if one exists.
    ///
    /// Returns `false` when the user has no cached index — the next query
    /// builds from scratch anyway, so there is nothing to extend.
    pub fn append(&self, user_id: &str, extra: Vec<IndexedChunk>) -> bool {
        let mut cache = self.inner.lock().expect("index cache lock poisoned");
        match cache.get(user_id) {
            Some(existing) => {
                let extended = Arc::new(existing.with_appended(extra));
                cache.put(user_id.to_string(), extended);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("index cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
