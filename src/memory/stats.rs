use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::HashMap;

use crate::memory::types::{Memory, SourceKind};

/// Response from memory_stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_memories: u64,
    pub encrypted_memories: u64,
    pub by_source: HashMap<String, u64>,
    /// Memories created within the trailing 7 days.
    pub last_7_days: u64,
    pub chat_messages: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_memory: Option<String>,
}

/// Compute per-user memory store statistics.
pub fn memory_stats(conn: &Connection, user_id: &str) -> Result<StatsResponse> {
    let memories = crate::memory::store::all_for_user(conn, user_id)?;

    let total = memories.len() as u64;
    let encrypted = memories.iter().filter(|m| m.encrypted).count() as u64;
    let by_source = count_by_source(&memories);
    let last_7_days = count_recent(&memories, 7);

    let chat_messages: i64 = conn.query_row(
        "SELECT COUNT(*) FROM chat_messages WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;

    let oldest = memories.first().map(|m| m.created_at.clone());
    let newest = memories.last().map(|m| m.created_at.clone());

    Ok(StatsResponse {
        total_memories: total,
        encrypted_memories: encrypted,
        by_source,
        last_7_days,
        chat_messages: chat_messages as u64,
        oldest_memory: oldest,
        newest_memory: newest,
    })
}

fn count_by_source(memories: &[Memory]) -> HashMap<String, u64> {
    let mut map = HashMap::new();
    for kind in [
        SourceKind::Note,
        SourceKind::Voice,
        SourceKind::Document,
        SourceKind::Image,
        SourceKind::Extension,
    ] {
        map.insert(kind.label().to_string(), 0);
    }
    for memory in memories {
        *map.entry(memory.source_kind().label().to_string())
            .or_insert(0) += 1;
    }
    map
}

/// Count memories created within the trailing `days` days.
fn count_recent(memories: &[Memory], days: i64) -> u64 {
    let cutoff = chrono::Utc::now() - chrono::Duration::days(days);
    memories
        .iter()
        .filter(|m| {
            chrono::DateTime::parse_from_rfc3339(&m.created_at)
                .map(|t| t.with_timezone(&chrono::Utc) >= cutoff)
                .unwrap_or(false)
        })
        .count() as u64
}
