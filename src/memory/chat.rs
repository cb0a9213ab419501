//! Chat message persistence and the recency window.
//!
//! Turns are append-only. [`recent_messages`] feeds the context assembler
//! (newest-first, caller reverses); [`history_page`] backs the paginated
//! history endpoint.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::memory::types::{ChatMessage, ChatRole};

/// Append a conversation turn.
pub fn append_message(
    conn: &Connection,
    user_id: &str,
    role: ChatRole,
    text: &str,
) -> Result<()> {
    let created_at = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO chat_messages (user_id, role, text, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, role.as_str(), text, created_at],
    )
    .context("failed to append chat message")?;
    Ok(())
}

/// The most recent `limit` turns for a user, newest first.
pub fn recent_messages(conn: &Connection, user_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, role, text, created_at FROM chat_messages
         WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![user_id, limit as i64], map_message)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// One chronological page of history plus the total turn count.
pub fn history_page(
    conn: &Connection,
    user_id: &str,
    limit: usize,
    offset: usize,
) -> Result<(Vec<ChatMessage>, u64)> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM chat_messages WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;

    // Page newest-first, then reverse so each page reads chronologically
    let mut stmt = conn.prepare(
        "SELECT user_id, role, text, created_at FROM chat_messages
         WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
    )?;
    let mut rows = stmt
        .query_map(params![user_id, limit as i64, offset as i64], map_message)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.reverse();

    Ok((rows, total as u64))
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    let role_str: String = row.get(1)?;
    Ok(ChatMessage {
        user_id: row.get(0)?,
        role: role_str.parse().unwrap_or(ChatRole::User),
        text: row.get(2)?,
        created_at: row.get(3)?,
    })
}
