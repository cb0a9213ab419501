//! Memory store queries.
//!
//! Append-only write path plus the read queries the retriever depends on:
//! full per-user listing (index build), encrypted-record listing (decrypt
//! scan), and the keyword/tag scan. Every query is scoped by `user_id` —
//! nothing here can cross tenant boundaries.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::memory::types::Memory;

/// Fields for a new memory record. Id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub user_id: String,
    pub content: String,
    pub blob_ref: Option<String>,
    pub file_name: Option<String>,
    pub encrypted: bool,
    pub tags: Vec<String>,
    pub emotion: Option<String>,
}

/// Insert a memory row. Returns the stored record with its assigned id.
pub fn insert_memory(conn: &Connection, new: NewMemory) -> Result<Memory> {
    let id = uuid::Uuid::now_v7().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();
    let tags_json = serde_json::to_string(&new.tags).context("failed to serialize tags")?;

    conn.execute(
        "INSERT INTO memories (id, user_id, content, blob_ref, file_name, encrypted, tags, emotion, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id,
            new.user_id,
            new.content,
            new.blob_ref,
            new.file_name,
            new.encrypted as i64,
            tags_json,
            new.emotion,
            created_at,
        ],
    )
    .context("failed to insert memory")?;

    Ok(Memory {
        id,
        user_id: new.user_id,
        content: new.content,
        blob_ref: new.blob_ref,
        file_name: new.file_name,
        encrypted: new.encrypted,
        tags: new.tags,
        emotion: new.emotion,
        created_at,
    })
}

/// Fetch a single memory by id.
pub fn get_memory(conn: &Connection, id: &str) -> Result<Option<Memory>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM memories WHERE id = ?1"),
        params![id],
        map_memory,
    )
    .optional()
    .context("failed to fetch memory")
}

/// All memories for a user in insertion order. Used for index builds.
pub fn all_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Memory>> {
    query_memories(
        conn,
        &format!("SELECT {COLUMNS} FROM memories WHERE user_id = ?1 ORDER BY rowid"),
        params![user_id],
    )
}

/// Newest-first listing with a row cap. Used by the list endpoint.
pub fn list_for_user(conn: &Connection, user_id: &str, limit: usize) -> Result<Vec<Memory>> {
    query_memories(
        conn,
        &format!("SELECT {COLUMNS} FROM memories WHERE user_id = ?1 ORDER BY rowid DESC LIMIT ?2"),
        params![user_id, limit as i64],
    )
}

/// Memories whose content lives behind an encrypted blob reference.
pub fn encrypted_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Memory>> {
    query_memories(
        conn,
        &format!(
            "SELECT {COLUMNS} FROM memories
             WHERE user_id = ?1 AND encrypted = 1 AND blob_ref IS NOT NULL
             ORDER BY rowid"
        ),
        params![user_id],
    )
}

/// Disjunctive keyword/tag scan: rows whose content contains any query token
/// (case-insensitive substring) or whose tag list contains a token verbatim.
///
/// Uses `instr` rather than `LIKE` so user-supplied tokens need no pattern
/// escaping. Results come back in insertion order, capped at `limit`.
pub fn keyword_matches(
    conn: &Connection,
    user_id: &str,
    tokens: &[String],
    limit: usize,
) -> Result<Vec<Memory>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut clauses = Vec::with_capacity(tokens.len() * 2);
    let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(user_id.to_string())];
    for token in tokens {
        let idx = args.len() + 1;
        clauses.push(format!("instr(lower(content), ?{idx}) > 0"));
        args.push(Box::new(token.to_lowercase()));
        let idx = args.len() + 1;
        clauses.push(format!("instr(lower(tags), ?{idx}) > 0"));
        // Tags are stored as a JSON array, so quote the token for a whole-tag match
        args.push(Box::new(format!("\"{}\"", token.to_lowercase())));
    }

    let sql = format!(
        "SELECT {COLUMNS} FROM memories WHERE user_id = ?1 AND ({})
         ORDER BY rowid LIMIT {limit}",
        clauses.join(" OR ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        args.iter().map(|a| a.as_ref()).collect();
    let rows = stmt
        .query_map(params_ref.as_slice(), map_memory)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Delete a memory by id. Returns the deleted record, if it existed, so the
/// caller can evict the owner's vector index.
pub fn delete_memory(conn: &Connection, id: &str) -> Result<Option<Memory>> {
    let existing = get_memory(conn, id)?;
    if existing.is_some() {
        conn.execute("DELETE FROM memories WHERE id = ?1", params![id])
            .context("failed to delete memory")?;
    }
    Ok(existing)
}

const COLUMNS: &str =
    "id, user_id, content, blob_ref, file_name, encrypted, tags, emotion, created_at";

fn query_memories(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Memory>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_memory)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_memory(row: &Row<'_>) -> rusqlite::Result<Memory> {
    let tags_json: String = row.get(6)?;
    Ok(Memory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        blob_ref: row.get(3)?,
        file_name: row.get(4)?,
        encrypted: row.get::<_, i64>(5)? != 0,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        emotion: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn note(user_id: &str, content: &str, tags: &[&str]) -> NewMemory {
        NewMemory {
            user_id: user_id.into(),
            content: content.into(),
            blob_ref: None,
            file_name: None,
            encrypted: false,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            emotion: None,
        }
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let conn = db::open_memory_database().unwrap();
        let stored = insert_memory(&conn, note("u1", "remember the milk", &["note"])).unwrap();

        let fetched = get_memory(&conn, &stored.id).unwrap().unwrap();
        assert_eq!(fetched.content, "remember the milk");
        assert_eq!(fetched.tags, vec!["note"]);
        assert!(!fetched.encrypted);
        assert!(fetched.blob_ref.is_none());
    }

    #[test]
    fn listing_is_scoped_to_one_user() {
        let conn = db::open_memory_database().unwrap();
        insert_memory(&conn, note("alice", "alice's secret", &[])).unwrap();
        insert_memory(&conn, note("bob", "bob's note", &[])).unwrap();

        let memories = all_for_user(&conn, "alice").unwrap();
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0].content, "alice's secret");
    }

    #[test]
    fn list_is_newest_first_and_capped() {
        let conn = db::open_memory_database().unwrap();
        for i in 0..5 {
            insert_memory(&conn, note("u1", &format!("memory {i}"), &[])).unwrap();
        }

        let listed = list_for_user(&conn, "u1", 3).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].content, "memory 4");
        assert_eq!(listed[2].content, "memory 2");
    }

    #[test]
    fn encrypted_listing_requires_blob_ref() {
        let conn = db::open_memory_database().unwrap();
        let mut enc = note("u1", crate::memory::ENCRYPTED_PLACEHOLDER, &["note"]);
        enc.encrypted = true;
        enc.blob_ref = Some("blob-1".into());
        insert_memory(&conn, enc).unwrap();

        // Encrypted flag without a blob ref is not resolvable — excluded
        let mut dangling = note("u1", crate::memory::ENCRYPTED_PLACEHOLDER, &[]);
        dangling.encrypted = true;
        insert_memory(&conn, dangling).unwrap();

        insert_memory(&conn, note("u1", "plain", &[])).unwrap();

        let encrypted = encrypted_for_user(&conn, "u1").unwrap();
        assert_eq!(encrypted.len(), 1);
        assert_eq!(encrypted[0].blob_ref.as_deref(), Some("blob-1"));
    }

    #[test]
    fn keyword_scan_matches_content_and_tags() {
        let conn = db::open_memory_database().unwrap();
        insert_memory(&conn, note("u1", "Project Apollo uses React and Node", &[])).unwrap();
        insert_memory(&conn, note("u1", "grocery list", &["hackathon"])).unwrap();
        insert_memory(&conn, note("u1", "unrelated text", &[])).unwrap();

        let by_content =
            keyword_matches(&conn, "u1", &["apollo".to_string()], 10).unwrap();
        assert_eq!(by_content.len(), 1);
        assert!(by_content[0].content.contains("Apollo"));

        let by_tag =
            keyword_matches(&conn, "u1", &["hackathon".to_string()], 10).unwrap();
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].content, "grocery list");
    }

    #[test]
    fn keyword_scan_ignores_percent_wildcards() {
        let conn = db::open_memory_database().unwrap();
        insert_memory(&conn, note("u1", "plain note", &[])).unwrap();

        // instr() treats tokens literally, so a wildcard matches nothing
        let hits = keyword_matches(&conn, "u1", &["%".to_string()], 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn delete_returns_the_removed_record() {
        let conn = db::open_memory_database().unwrap();
        let stored = insert_memory(&conn, note("u1", "ephemeral", &[])).unwrap();

        let deleted = delete_memory(&conn, &stored.id).unwrap().unwrap();
        assert_eq!(deleted.id, stored.id);
        assert!(get_memory(&conn, &stored.id).unwrap().is_none());
        assert!(delete_memory(&conn, &stored.id).unwrap().is_none());
    }
}
