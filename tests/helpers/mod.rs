#![allow(dead_code)]

use std::sync::Arc;

use twinvault::blob::MemoryBlobStore;
use twinvault::config::TwinConfig;
use twinvault::crypto::MemoryCipher;
use twinvault::db;
use twinvault::embedding::mock::MockEmbeddingProvider;
use twinvault::engine::{StoreRequest, TwinEngine};
use twinvault::llm::mock::MockTextGenerator;
use twinvault::memory::types::Memory;

pub const TEST_KEY: [u8; 32] = [7u8; 32];

/// An engine wired entirely to in-memory collaborators, with handles kept so
/// tests can script replies and trip failure switches.
pub struct TestTwin {
    pub engine: TwinEngine,
    pub embedding: Arc<MockEmbeddingProvider>,
    pub generator: Arc<MockTextGenerator>,
    pub blobs: Arc<MemoryBlobStore>,
}

/// Build a fresh engine on an in-memory database with default config.
pub fn test_engine() -> TestTwin {
    test_engine_with(TwinConfig::default())
}

pub fn test_engine_with(config: TwinConfig) -> TestTwin {
    let conn = db::open_memory_database().unwrap();
    let embedding = Arc::new(MockEmbeddingProvider::new(config.embedding.dimensions));
    let generator = Arc::new(MockTextGenerator::new());
    let blobs = Arc::new(MemoryBlobStore::new());

    let engine = TwinEngine::new(
        conn,
        Arc::clone(&embedding) as Arc<dyn twinvault::embedding::EmbeddingProvider>,
        Arc::clone(&generator) as Arc<dyn twinvault::llm::TextGenerator>,
        Arc::clone(&blobs) as Arc<dyn twinvault::blob::BlobStore>,
        MemoryCipher::new(TEST_KEY),
        config,
    );

    TestTwin {
        engine,
        embedding,
        generator,
        blobs,
    }
}

/// Store a plaintext note for `user_id`.
pub async fn store_note(twin: &TestTwin, user_id: &str, content: &str, tags: &[&str]) -> Memory {
    twin.engine
        .store_memory(StoreRequest {
            user_id: user_id.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            emotion: None,
            file_name: None,
            encrypt: false,
        })
        .await
        .unwrap()
}

/// Store an encrypted memory for `user_id` (content sealed into the blob store).
pub async fn store_encrypted(twin: &TestTwin, user_id: &str, content: &str) -> Memory {
    twin.engine
        .store_memory(StoreRequest {
            user_id: user_id.to_string(),
            content: content.to_string(),
            tags: vec![],
            emotion: None,
            file_name: None,
            encrypt: true,
        })
        .await
        .unwrap()
}
