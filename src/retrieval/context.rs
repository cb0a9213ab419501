//! Context assembly.
//!
//! Renders the prompt context handed to the reply model: recent
//! conversation, ranked memories, and the intent guidance line, joined with
//! blank lines. Empty sections are omitted; the guidance line is always
//! present.

use crate::memory::types::{ChatMessage, RankedCandidate};
use crate::retrieval::intent::Intent;

/// Assemble the context string.
///
/// `history` arrives newest-first (storage order) and is reversed here so
/// the conversation reads chronologically.
pub fn render_context(
    history: &[ChatMessage],
    memories: &[RankedCandidate],
    intent: Intent,
) -> String {
    let conversation = history
        .iter()
        .rev()
        .map(|msg| format!("{}: {}", msg.role.display_name(), msg.text))
        .collect::<Vec<_>>()
        .join("\n");

    let memory_lines = memories
        .iter()
        .map(|mem| format!("- [{}] {}", mem.source.label(), mem.content.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    let mut sections = Vec::new();
    if !conversation.is_empty() {
        sections.push(format!("Recent conversation:\n{conversation}"));
    }
    if !memory_lines.is_empty() {
        sections.push(format!("Relevant memories:\n{memory_lines}"));
    }
    sections.push(format!("Context guidance: {}", intent.guidance()));

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::{ChatRole, SourceKind};

    fn turn(role: ChatRole, text: &str) -> ChatMessage {
        ChatMessage {
            user_id: "u1".into(),
            role,
            text: text.into(),
            created_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    fn candidate(content: &str, source: SourceKind) -> RankedCandidate {
        RankedCandidate {
            content: content.into(),
            score: 0.5,
            source,
        }
    }

    #[test]
    fn all_sections_render_in_order() {
        // Storage order is newest-first
        let history = vec![
            turn(ChatRole::Assistant, "Hello! How can I help?"),
            turn(ChatRole::User, "hi"),
        ];
        let memories = vec![candidate("Apollo uses React", SourceKind::Note)];

        let context = render_context(&history, &memories, Intent::ProjectDiscussion);

        let expected = "Recent conversation:\n\
                        You: hi\n\
                        Twin: Hello! How can I help?\n\n\
                        Relevant memories:\n\
                        - [Note] Apollo uses React\n\n\
                        Context guidance: Provide technical insights and practical development advice.";
        assert_eq!(context, expected);
    }

    #[test]
    fn empty_sections_are_omitted() {
        let context = render_context(&[], &[], Intent::General);
        assert_eq!(
            context,
            "Context guidance: Be helpful and conversational, drawing from available context when relevant."
        );
        assert!(!context.contains("Recent conversation"));
        assert!(!context.contains("Relevant memories"));
    }

    #[test]
    fn memory_lines_carry_source_labels() {
        let memories = vec![
            candidate("a chunk", SourceKind::Vector),
            candidate("  padded transcript  ", SourceKind::Voice),
        ];
        let context = render_context(&[], &memories, Intent::General);

        assert!(context.contains("- [Vector Memory] a chunk"));
        assert!(context.contains("- [Voice Memo] padded transcript"));
    }
}
