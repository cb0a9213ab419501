//! Retrieval and ranking primitives.
//!
//! Pure, collaborator-free pieces of the query pipeline: the lexical
//! relevance scorer, intent labels and classification, candidate merging,
//! and context assembly. The orchestration that wires them to storage and
//! the collaborators lives in [`crate::engine`].

pub mod context;
pub mod intent;
pub mod rank;
pub mod scorer;

/// Lowercase query tokens longer than two characters — the unit of keyword
/// matching across all three retrieval sources.
pub fn query_tokens(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 2)
        .map(|word| word.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_lowercased_and_filtered() {
        assert_eq!(
            query_tokens("What stack does Apollo use?"),
            vec!["what", "stack", "does", "apollo", "use?"]
        );
        assert_eq!(query_tokens("is it ok"), Vec::<String>::new());
        assert!(query_tokens("").is_empty());
    }
}
