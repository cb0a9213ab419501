//! SQL DDL for all twinvault tables.
//!
//! Defines the `memories`, `chat_messages`, and `schema_meta` tables. All DDL
//! uses `IF NOT EXISTS` for idempotent initialization. Memory rows are
//! append-only: inserted on capture, deleted on request, never updated.

use rusqlite::Connection;

/// All schema DDL statements for twinvault's core tables.
const SCHEMA_SQL: &str = r#"
-- Core memory storage. `content` holds plaintext or the '[encrypted]'
-- placeholder; encrypted rows carry a blob_ref to the ciphertext envelope.
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    content TEXT NOT NULL,
    blob_ref TEXT,
    file_name TEXT,
    encrypted INTEGER NOT NULL DEFAULT 0 CHECK(encrypted IN (0, 1)),
    tags TEXT NOT NULL DEFAULT '[]',
    emotion TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_memories_user ON memories(user_id);
CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_memories_encrypted ON memories(user_id, encrypted);

-- Conversation turns, used for the recency window and paginated history.
CREATE TABLE IF NOT EXISTS chat_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    role TEXT NOT NULL CHECK(role IN ('user','assistant')),
    text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chat_user ON chat_messages(user_id, id);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
