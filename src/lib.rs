//! Personal AI-twin memory engine.
//!
//! Twinvault stores a user's notes, voice transcripts, documents, and browser
//! captures as **memories** — plaintext rows or pointers to encrypted blobs —
//! and answers free-text questions by surfacing the most relevant subset of
//! that private store to ground an LLM reply.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with append-only `memories` and `chat_messages`
//!   tables, strictly scoped per user
//! - **Retrieval**: three independent candidate sources — an in-memory vector
//!   index over chunked embeddings, a decrypt-and-scan pass over encrypted
//!   blobs, and a keyword/tag scan — merged, deduplicated, and ranked by
//!   lexical relevance plus per-source bonuses
//! - **Context**: recent conversation + ranked memories + an intent-specific
//!   instruction line, assembled into one prompt for the reply model
//! - **Collaborators**: the chat model, embedding model, and blob store sit
//!   behind trait seams; every remote call carries a bounded timeout and
//!   fails soft
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and health checks
//! - [`memory`] — Memory records, store queries, chat history, and statistics
//! - [`crypto`] — AES-256-GCM envelope for encrypted memory content
//! - [`blob`] — Blob store seam for externally held encrypted content
//! - [`embedding`] — Text-to-vector embedding seam
//! - [`llm`] — Chat-completion seam for intent classification and replies
//! - [`index`] — Per-user in-memory vector index behind a bounded LRU cache
//! - [`retrieval`] — Lexical scoring, intent classification, ranking, and context assembly
//! - [`engine`] — The query pipeline: classify → retrieve → assemble → reply

pub mod blob;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod db;
pub mod embedding;
pub mod engine;
pub mod index;
pub mod llm;
pub mod memory;
pub mod retrieval;
pub mod server;
