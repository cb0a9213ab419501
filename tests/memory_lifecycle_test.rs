//! Memory lifecycle tests: storing (plaintext and sealed), listing,
//! deleting, and the per-user statistics rollup.

mod helpers;

use helpers::{store_encrypted, store_note, test_engine, TEST_KEY};
use twinvault::blob::BlobStore;
use twinvault::crypto::MemoryCipher;
use twinvault::memory::ENCRYPTED_PLACEHOLDER;

#[tokio::test]
async fn encrypted_store_keeps_only_a_placeholder_row() {
    let twin = test_engine();
    let memory = store_encrypted(&twin, "alice", "the safe combination is 4-8-15").await;

    assert!(memory.encrypted);
    assert_eq!(memory.content, ENCRYPTED_PLACEHOLDER);
    let blob_ref = memory.blob_ref.as_deref().expect("sealed row needs a blob ref");

    // the blob holds a valid envelope that decrypts back to the original
    let envelope = String::from_utf8(twin.blobs.get(blob_ref).await.unwrap()).unwrap();
    let plaintext = MemoryCipher::new(TEST_KEY).decrypt(&envelope).unwrap();
    assert_eq!(plaintext, "the safe combination is 4-8-15");
}

#[tokio::test]
async fn listing_is_scoped_and_newest_first() {
    let twin = test_engine();
    store_note(&twin, "alice", "older note", &[]).await;
    store_note(&twin, "alice", "newer note", &[]).await;
    store_note(&twin, "bob", "bob's note", &[]).await;

    let memories = twin.engine.list_memories("alice", 10).unwrap();
    assert_eq!(memories.len(), 2);
    assert_eq!(memories[0].content, "newer note");
    assert_eq!(memories[1].content, "older note");
}

#[tokio::test]
async fn delete_returns_the_record_once() {
    let twin = test_engine();
    let memory = store_note(&twin, "alice", "disposable thought", &[]).await;

    let deleted = twin.engine.delete_memory(&memory.id).unwrap();
    assert_eq!(deleted.map(|m| m.id), Some(memory.id.clone()));

    assert!(twin.engine.delete_memory(&memory.id).unwrap().is_none());
    assert!(twin.engine.list_memories("alice", 10).unwrap().is_empty());
}

#[tokio::test]
async fn deleted_memories_leave_the_index() {
    let twin = test_engine();
    let memory = store_note(&twin, "alice", "obsolete kumquat trivia", &[]).await;
    store_note(&twin, "alice", "current gardening plan", &[]).await;

    // build and cache the index, then delete
    twin.engine.retrieve("alice", "kumquat").await.unwrap();
    twin.engine.delete_memory(&memory.id).unwrap();

    let candidates = twin.engine.retrieve("alice", "kumquat trivia").await.unwrap();
    assert!(candidates.iter().all(|c| !c.content.contains("kumquat")));
}

#[tokio::test]
async fn stats_roll_up_per_user() {
    let twin = test_engine();
    store_note(&twin, "alice", "plain note one", &[]).await;
    store_note(&twin, "alice", "standup recording", &["voice"]).await;
    store_encrypted(&twin, "alice", "sealed secret").await;
    store_note(&twin, "bob", "not alice's", &[]).await;
    twin.engine
        .record_turn("alice", twinvault::memory::types::ChatRole::User, "hello")
        .unwrap();

    let stats = twin.engine.memory_stats("alice").unwrap();
    assert_eq!(stats.total_memories, 3);
    assert_eq!(stats.encrypted_memories, 1);
    assert_eq!(stats.last_7_days, 3);
    assert_eq!(stats.chat_messages, 1);
    assert_eq!(stats.by_source.get("Voice Memo"), Some(&1));
    assert_eq!(stats.by_source.get("Note"), Some(&2));
    assert!(stats.oldest_memory.is_some());
    assert!(stats.newest_memory.is_some());
}
