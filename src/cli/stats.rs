use anyhow::Result;

use crate::config::TwinConfig;

/// Display a user's memory statistics in the terminal.
pub fn stats(config: &TwinConfig, user_id: &str) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let response = crate::memory::stats::memory_stats(&conn, user_id)?;

    println!("Memory Statistics for {user_id}");
    println!("{}", "=".repeat(40));
    println!("  Total memories:      {}", response.total_memories);
    println!("  Encrypted:           {}", response.encrypted_memories);
    println!("  Last 7 days:         {}", response.last_7_days);
    println!("  Chat messages:       {}", response.chat_messages);
    println!();

    println!("By Source:");
    for source in &["Note", "Voice Memo", "Document", "Image", "Extension Capture"] {
        let count = response.by_source.get(*source).copied().unwrap_or(0);
        println!("  {:<18} {}", source, count);
    }
    println!();

    if let Some(ref oldest) = response.oldest_memory {
        println!("Oldest memory:         {oldest}");
    }
    if let Some(ref newest) = response.newest_memory {
        println!("Newest memory:         {newest}");
    }

    Ok(())
}
