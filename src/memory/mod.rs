pub mod chat;
pub mod stats;
pub mod store;
pub mod types;

/// Placeholder stored in `content` when the real text lives behind an
/// encrypted blob reference.
pub const ENCRYPTED_PLACEHOLDER: &str = "[encrypted]";
