//! Core memory type definitions.
//!
//! Defines [`SourceKind`] (the closed set of memory sources), [`Memory`]
//! (a stored record), [`ChatRole`] and [`ChatMessage`] (conversation turns),
//! and [`RankedCandidate`] (an ephemeral scored retrieval result).

use serde::{Deserialize, Serialize};

/// Where a piece of memory content came from.
///
/// Stored memories derive their kind from tags with a fixed priority
/// ([`SourceKind::from_tags`]); untagged content is a plain note. `Vector`
/// is the retrieval-channel label for chunks surfaced by the embedding
/// index — it is never derived from tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Note,
    Voice,
    Document,
    Image,
    Extension,
    Vector,
}

impl SourceKind {
    /// Derive the kind from a memory's tag list. Priority: voice > document
    /// > image > extension; anything else is a note.
    pub fn from_tags(tags: &[String]) -> Self {
        let has = |t: &str| tags.iter().any(|tag| tag == t);
        if has("voice") {
            Self::Voice
        } else if has("document") {
            Self::Document
        } else if has("image") {
            Self::Image
        } else if has("extension") {
            Self::Extension
        } else {
            Self::Note
        }
    }

    /// Human-readable label, used both as the embedded-text prefix and the
    /// candidate source marker in assembled context.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Voice => "Voice Memo",
            Self::Document => "Document",
            Self::Image => "Image",
            Self::Extension => "Extension Capture",
            Self::Vector => "Vector Memory",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A memory record, matching the `memories` table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    /// Owner. All retrieval is scoped to one user's memories.
    pub user_id: String,
    /// Plaintext content, or [`ENCRYPTED_PLACEHOLDER`](super::ENCRYPTED_PLACEHOLDER)
    /// when the text lives behind `blob_ref`.
    pub content: String,
    /// Pointer to the externally stored ciphertext envelope, if encrypted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_ref: Option<String>,
    /// Original file name for document/image uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Whether the true content is encrypted behind `blob_ref`.
    pub encrypted: bool,
    /// Category labels (`note`, `voice`, `document`, `image`, `extension`, ...).
    pub tags: Vec<String>,
    /// Free-text affect label. Metadata only, never used in ranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

impl Memory {
    pub fn source_kind(&self) -> SourceKind {
        SourceKind::from_tags(&self.tags)
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Display name used when rendering conversation context.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Twin",
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("unknown chat role: {s}")),
        }
    }
}

/// A conversation turn, matching the `chat_messages` table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user_id: String,
    pub role: ChatRole,
    pub text: String,
    pub created_at: String,
}

/// A scored, sourced piece of retrieved text proposed for the LLM context.
///
/// Produced fresh per query and discarded after context assembly — never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub content: String,
    pub score: f64,
    pub source: SourceKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn source_kind_priority() {
        assert_eq!(SourceKind::from_tags(&tags(&["voice", "document"])), SourceKind::Voice);
        assert_eq!(SourceKind::from_tags(&tags(&["document"])), SourceKind::Document);
        assert_eq!(SourceKind::from_tags(&tags(&["image", "extension"])), SourceKind::Image);
        assert_eq!(SourceKind::from_tags(&tags(&["extension"])), SourceKind::Extension);
    }

    #[test]
    fn untagged_content_is_a_note() {
        assert_eq!(SourceKind::from_tags(&[]), SourceKind::Note);
        assert_eq!(SourceKind::from_tags(&tags(&["work", "ideas"])), SourceKind::Note);
    }

    #[test]
    fn chat_role_round_trip() {
        assert_eq!("user".parse::<ChatRole>().unwrap(), ChatRole::User);
        assert_eq!("assistant".parse::<ChatRole>().unwrap(), ChatRole::Assistant);
        assert!("system".parse::<ChatRole>().is_err());
        assert_eq!(ChatRole::User.display_name(), "You");
        assert_eq!(ChatRole::Assistant.display_name(), "Twin");
    }
}
