//! The query pipeline and memory lifecycle orchestrator.
//!
//! [`TwinEngine`] owns the database handle, the collaborator seams, and the
//! per-user index cache, and runs the full pipeline for each question:
//! classify → retrieve from three sources → assemble context → generate a
//! reply. Within one request the steps are strictly sequential; across
//! requests only the index cache is shared, and it is a pure performance
//! cache — the memory rows stay authoritative.
//!
//! Failure policy: collaborator errors (embedding, blob fetch, decryption,
//! chat model) degrade the affected source or fall back to a canned reply;
//! only storage-level errors propagate to the caller.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::blob::{BlobStore, LocalBlobStore};
use crate::config::TwinConfig;
use crate::crypto::MemoryCipher;
use crate::db;
use crate::embedding::EmbeddingProvider;
use crate::index::{chunker, IndexCache, IndexedChunk, VectorIndex};
use crate::llm::TextGenerator;
use crate::memory::chat;
use crate::memory::stats::StatsResponse;
use crate::memory::store;
use crate::memory::types::{ChatMessage, ChatRole, Memory, RankedCandidate, SourceKind};
use crate::memory::ENCRYPTED_PLACEHOLDER;
use crate::retrieval::context::render_context;
use crate::retrieval::intent::{classify, Intent};
use crate::retrieval::query_tokens;
use crate::retrieval::rank::merge_candidates;
use crate::retrieval::scorer::relevance;

/// Timeout for blob fetches (local reads never hit it; remote refs do).
const BLOB_TIMEOUT_SECS: u64 = 30;

/// Minimum assembled-context length before it is worth sending to the
/// reply model alongside the question.
const MIN_USEFUL_CONTEXT: usize = 50;

/// Guidelines appended to every reply system prompt.
const REPLY_GUIDELINES: &str = "Important guidelines:\n\
    - Only use context information that's clearly relevant to the user's question\n\
    - If context seems irrelevant or unclear, acknowledge this honestly\n\
    - Don't make assumptions based on limited context\n\
    - Be conversational and natural, not robotic\n\
    - Reference specific details from context when they're relevant\n\
    - If you're unsure about something from the context, say so";

/// Result of one answered query.
#[derive(Debug, Serialize)]
pub struct QueryOutcome {
    pub reply: String,
    pub intent: Intent,
    pub memories_found: usize,
    pub context_length: usize,
}

/// Request to store a new memory.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub user_id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub emotion: Option<String>,
    pub file_name: Option<String>,
    /// Encrypt the content into the blob store, keeping only a placeholder
    /// and a blob ref in the row.
    pub encrypt: bool,
}

pub struct TwinEngine {
    db: Arc<Mutex<Connection>>,
    embedding: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn TextGenerator>,
    blobs: Arc<dyn BlobStore>,
    cipher: MemoryCipher,
    index: IndexCache,
    config: Arc<TwinConfig>,
}

impl TwinEngine {
    pub fn new(
        conn: Connection,
        embedding: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn TextGenerator>,
        blobs: Arc<dyn BlobStore>,
        cipher: MemoryCipher,
        config: TwinConfig,
    ) -> Self {
        let index = IndexCache::new(config.retrieval.index_cache_size);
        Self {
            db: Arc::new(Mutex::new(conn)),
            embedding,
            generator,
            blobs,
            cipher,
            index,
            config: Arc::new(config),
        }
    }

    /// Wire up the production collaborators from config.
    pub fn from_config(config: TwinConfig) -> Result<Self> {
        let conn = db::open_database(config.resolved_db_path())?;
        let cipher = MemoryCipher::from_env(&config.storage.encryption_key_env)
            .context("encryption key unavailable")?;
        let blobs = LocalBlobStore::new(
            config.resolved_blob_dir(),
            Duration::from_secs(BLOB_TIMEOUT_SECS),
        )?;
        let embedding = crate::embedding::create_provider(&config.embedding)?;
        let generator = crate::llm::create_generator(&config.llm)?;

        Ok(Self::new(
            conn,
            Arc::from(embedding),
            Arc::from(generator),
            Arc::new(blobs),
            cipher,
            config,
        ))
    }

    pub fn config(&self) -> &TwinConfig {
        &self.config
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().expect("database lock poisoned")
    }

    // ── Query pipeline ────────────────────────────────────────────────────

    /// Answer a free-text question against the user's memory store.
    ///
    /// Always produces a non-empty reply: retrieval failures degrade the
    /// context, and a dead chat model yields the intent's canned fallback.
    pub async fn answer_query(&self, user_id: &str, message: &str) -> Result<QueryOutcome> {
        let intent = classify(self.generator.as_ref(), message).await;
        debug!(user = %user_id, intent = %intent, "classified query");

        let candidates = self.retrieve(user_id, message).await?;
        let history = {
            let conn = self.conn();
            chat::recent_messages(&conn, user_id, self.config.retrieval.history_window)?
        };

        let context = render_context(&history, &candidates, intent);
        let reply = self.generate_reply(message, &context, intent).await;

        info!(
            user = %user_id,
            intent = %intent,
            memories = candidates.len(),
            context_len = context.len(),
            "answered query"
        );

        Ok(QueryOutcome {
            reply,
            intent,
            memories_found: candidates.len(),
            context_length: context.len(),
        })
    }

    async fn generate_reply(&self, message: &str, context: &str, intent: Intent) -> String {
        let system = format!("{}\n\n{}", intent.system_prompt(), REPLY_GUIDELINES);
        let user = if context.trim().len() > MIN_USEFUL_CONTEXT {
            format!("Context information:\n{context}\n\nCurrent question: {message}")
        } else {
            message.to_string()
        };

        match self.generator.complete(&system, &user, 0.7).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => intent.fallback_reply().to_string(),
            Err(err) => {
                warn!(error = %err, "reply generation failed, using fallback");
                intent.fallback_reply().to_string()
            }
        }
    }

    /// Gather, score, and rank memory candidates from the three sources.
    ///
    /// Any single source failing contributes nothing; an empty store yields
    /// an empty list. Only storage-level errors propagate.
    pub async fn retrieve(&self, user_id: &str, message: &str) -> Result<Vec<RankedCandidate>> {
        let retrieval = &self.config.retrieval;
        let tokens = query_tokens(message);
        let mut candidates: Vec<RankedCandidate> = Vec::new();

        // 1. Vector source
        if let Some(index) = self.build_index(user_id, false).await? {
            match self.embedding.embed(message).await {
                Ok(query_vector) => {
                    let hits = index.search(&query_vector, retrieval.vector_k);
                    debug!(user = %user_id, hits = hits.len(), "vector matches");
                    for hit in hits {
                        let score = relevance(&hit.text, message) + retrieval.vector_bonus;
                        candidates.push(RankedCandidate {
                            content: hit.text,
                            score,
                            source: SourceKind::Vector,
                        });
                    }
                }
                Err(err) => {
                    warn!(error = %err, "query embedding failed, skipping vector source");
                }
            }
        }

        // 2. Encrypted-record source
        let encrypted = {
            let conn = self.conn();
            store::encrypted_for_user(&conn, user_id)?
        };
        for memory in &encrypted {
            let Some(text) = self.fetch_and_decrypt(memory).await else {
                continue;
            };
            let score = relevance(&text, message);
            let text_lower = text.to_lowercase();
            let matched_keyword = tokens.iter().any(|token| text_lower.contains(token.as_str()));

            if score > retrieval.min_encrypted_score || matched_keyword {
                let bonus = if matched_keyword {
                    retrieval.encrypted_keyword_bonus
                } else {
                    0.0
                };
                candidates.push(RankedCandidate {
                    content: text,
                    score: score + bonus,
                    source: memory.source_kind(),
                });
            }
        }

        // 3. Keyword/tag source
        if !tokens.is_empty() {
            let matches = {
                let conn = self.conn();
                store::keyword_matches(&conn, user_id, &tokens, retrieval.keyword_limit)?
            };
            debug!(user = %user_id, matches = matches.len(), "keyword matches");
            for memory in matches {
                // Placeholder rows carry no searchable text
                if memory.content.is_empty() || memory.content == ENCRYPTED_PLACEHOLDER {
                    continue;
                }
                let score = relevance(&memory.content, message) + retrieval.tag_bonus;
                let source = memory.source_kind();
                candidates.push(RankedCandidate {
                    content: memory.content,
                    score,
                    source,
                });
            }
        }

        Ok(merge_candidates(candidates, retrieval.max_candidates))
    }

    // ── Embedding index ───────────────────────────────────────────────────

    /// Build or fetch the user's vector index.
    ///
    /// Returns `Ok(None)` when the corpus is empty or the embedding model is
    /// unavailable — callers degrade to the non-vector sources. Only storage
    /// errors propagate. `force_rebuild` evicts any cached index first.
    pub async fn build_index(
        &self,
        user_id: &str,
        force_rebuild: bool,
    ) -> Result<Option<Arc<VectorIndex>>> {
        if force_rebuild {
            self.index.evict(user_id);
        } else if let Some(cached) = self.index.get(user_id) {
            debug!(user = %user_id, chunks = cached.len(), "using cached index");
            return Ok(Some(cached));
        }

        let memories = {
            let conn = self.conn();
            store::all_for_user(&conn, user_id)?
        };
        if memories.is_empty() {
            debug!(user = %user_id, "no memories, skipping index build");
            return Ok(None);
        }

        let mut labeled = Vec::new();
        for memory in &memories {
            if let Some(text) = self.resolve_text(memory).await {
                if !text.trim().is_empty() {
                    labeled.push(label_text(memory.source_kind(), &text));
                }
            }
        }
        if labeled.is_empty() {
            debug!(user = %user_id, "no resolvable memory text, skipping index build");
            return Ok(None);
        }

        let corpus = labeled.join("\n");
        let retrieval = &self.config.retrieval;
        let chunks = chunker::split_text(&corpus, retrieval.chunk_size, retrieval.chunk_overlap);

        let vectors = match self.embedding.embed_batch(&chunks).await {
            Ok(vectors) => vectors,
            Err(err) => {
                warn!(error = %err, user = %user_id, "embedding failed, index unavailable");
                return Ok(None);
            }
        };

        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| IndexedChunk { text, vector })
            .collect();

        let index = Arc::new(VectorIndex::new(indexed));
        info!(user = %user_id, chunks = index.len(), "vector index built");
        self.index.insert(user_id, Arc::clone(&index));
        Ok(Some(index))
    }

    /// Incrementally embed one new memory into the user's cached index.
    ///
    /// No-op when nothing is cached (the next query builds from scratch).
    /// On embedding failure the cached index is evicted so a full rebuild
    /// repairs it later.
    async fn upsert_index(&self, user_id: &str, labeled_text: &str) {
        if self.index.get(user_id).is_none() {
            return;
        }

        let retrieval = &self.config.retrieval;
        let chunks =
            chunker::split_text(labeled_text, retrieval.chunk_size, retrieval.chunk_overlap);
        if chunks.is_empty() {
            return;
        }

        match self.embedding.embed_batch(&chunks).await {
            Ok(vectors) => {
                let extra: Vec<IndexedChunk> = chunks
                    .into_iter()
                    .zip(vectors)
                    .map(|(text, vector)| IndexedChunk { text, vector })
                    .collect();
                self.index.append(user_id, extra);
                debug!(user = %user_id, "index upserted");
            }
            Err(err) => {
                warn!(error = %err, user = %user_id, "upsert embedding failed, evicting index");
                self.index.evict(user_id);
            }
        }
    }

    /// Resolve a memory's true text: decrypt blob-backed rows, pass through
    /// plaintext, skip placeholders. All failures are per-record soft
    /// failures.
    async fn resolve_text(&self, memory: &Memory) -> Option<String> {
        if memory.encrypted {
            return self.fetch_and_decrypt(memory).await;
        }
        if memory.content.is_empty() || memory.content == ENCRYPTED_PLACEHOLDER {
            return None;
        }
        Some(memory.content.clone())
    }

    async fn fetch_and_decrypt(&self, memory: &Memory) -> Option<String> {
        let blob_ref = memory.blob_ref.as_deref()?;

        let bytes = match self.blobs.get(blob_ref).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(memory = %memory.id, error = %err, "blob fetch failed, skipping record");
                return None;
            }
        };
        let envelope = match String::from_utf8(bytes) {
            Ok(envelope) => envelope,
            Err(_) => {
                warn!(memory = %memory.id, "blob is not a valid envelope, skipping record");
                return None;
            }
        };
        match self.cipher.decrypt(&envelope) {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(memory = %memory.id, error = %err, "decryption failed, skipping record");
                None
            }
        }
    }

    // ── Memory lifecycle ──────────────────────────────────────────────────

    /// Store a new memory, optionally sealing the content into the blob
    /// store, then incrementally index it.
    pub async fn store_memory(&self, request: StoreRequest) -> Result<Memory> {
        let (row_content, blob_ref, encrypted) = if request.encrypt {
            let envelope = self
                .cipher
                .encrypt(&request.content)
                .context("failed to encrypt memory content")?;
            let blob_ref = self.blobs.put(envelope.as_bytes()).await?;
            (ENCRYPTED_PLACEHOLDER.to_string(), Some(blob_ref), true)
        } else {
            (request.content.clone(), None, false)
        };

        let memory = {
            let conn = self.conn();
            store::insert_memory(
                &conn,
                store::NewMemory {
                    user_id: request.user_id.clone(),
                    content: row_content,
                    blob_ref,
                    file_name: request.file_name,
                    encrypted,
                    tags: request.tags,
                    emotion: request.emotion,
                },
            )?
        };
        info!(user = %request.user_id, memory = %memory.id, encrypted, "memory stored");

        let labeled = label_text(memory.source_kind(), &request.content);
        self.upsert_index(&request.user_id, &labeled).await;

        Ok(memory)
    }

    /// Delete a memory and evict its owner's index.
    pub fn delete_memory(&self, id: &str) -> Result<Option<Memory>> {
        let deleted = {
            let conn = self.conn();
            store::delete_memory(&conn, id)?
        };
        if let Some(ref memory) = deleted {
            self.index.evict(&memory.user_id);
            info!(user = %memory.user_id, memory = %memory.id, "memory deleted");
        }
        Ok(deleted)
    }

    pub fn list_memories(&self, user_id: &str, limit: usize) -> Result<Vec<Memory>> {
        let conn = self.conn();
        store::list_for_user(&conn, user_id, limit)
    }

    pub fn memory_stats(&self, user_id: &str) -> Result<StatsResponse> {
        let conn = self.conn();
        crate::memory::stats::memory_stats(&conn, user_id)
    }

    // ── Chat history ──────────────────────────────────────────────────────

    pub fn record_turn(&self, user_id: &str, role: ChatRole, text: &str) -> Result<()> {
        let conn = self.conn();
        chat::append_message(&conn, user_id, role, text)
    }

    pub fn history(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<ChatMessage>, u64)> {
        let conn = self.conn();
        chat::history_page(&conn, user_id, limit, offset)
    }
}

/// Prefix memory text with its source label before embedding, so the label
/// travels with every chunk.
fn label_text(kind: SourceKind, text: &str) -> String {
    format!("[{}] {}", kind.label(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_prefix_the_text() {
        assert_eq!(
            label_text(SourceKind::Voice, "standup notes"),
            "[Voice Memo] standup notes"
        );
        assert_eq!(label_text(SourceKind::Note, "plain"), "[Note] plain");
    }
}
