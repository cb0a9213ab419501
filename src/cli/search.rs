use anyhow::Result;

use crate::config::TwinConfig;
use crate::engine::TwinEngine;

/// Run a retrieval query from the terminal and print the ranked candidates.
pub async fn search(config: TwinConfig, user_id: &str, query: &str) -> Result<()> {
    let engine = TwinEngine::from_config(config)?;
    let candidates = engine.retrieve(user_id, query).await?;

    if candidates.is_empty() {
        println!("No matching memories.");
        return Ok(());
    }

    println!("Found {} candidate(s)\n", candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        let preview: String = if candidate.content.chars().count() > 120 {
            let cut: String = candidate.content.chars().take(120).collect();
            format!("{cut}...")
        } else {
            candidate.content.clone()
        };

        println!(
            "  {}. [{}] score {:.3}",
            i + 1,
            candidate.source.label(),
            candidate.score,
        );
        println!("     {preview}");
        println!();
    }

    Ok(())
}
