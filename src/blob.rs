//! Blob store seam for externally held encrypted memory content.
//!
//! Memories can keep their true text outside the database: the ciphertext
//! envelope goes into a blob store and the row carries only a `blob_ref`.
//! [`LocalBlobStore`] writes files under the configured blob directory and
//! also resolves `http(s)` refs read-only, matching the original deployment
//! where blobs lived on a remote pinning service. [`MemoryBlobStore`] backs
//! the tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes, returning an opaque reference for later fetch.
    async fn put(&self, bytes: &[u8]) -> Result<String>;

    /// Fetch bytes by reference.
    async fn get(&self, blob_ref: &str) -> Result<Vec<u8>>;
}

/// Filesystem-backed blob store with read-only passthrough for remote refs.
pub struct LocalBlobStore {
    root: PathBuf,
    client: reqwest::Client,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf, timeout: Duration) -> Result<Self> {
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create blob dir {}", root.display()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build blob HTTP client")?;
        Ok(Self { root, client })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, bytes: &[u8]) -> Result<String> {
        let key = uuid::Uuid::now_v7().to_string();
        let path = self.path_for(&key);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write blob {}", path.display()))?;
        Ok(key)
    }

    async fn get(&self, blob_ref: &str) -> Result<Vec<u8>> {
        if blob_ref.starts_with("http://") || blob_ref.starts_with("https://") {
            let response = self
                .client
                .get(blob_ref)
                .send()
                .await
                .with_context(|| format!("blob fetch failed for {blob_ref}"))?;
            anyhow::ensure!(
                response.status().is_success(),
                "blob fetch returned HTTP {}",
                response.status()
            );
            return Ok(response.bytes().await?.to_vec());
        }

        // Local keys are opaque UUIDs — reject anything path-like
        anyhow::ensure!(
            !blob_ref.contains('/') && !blob_ref.contains('\\') && !blob_ref.contains(".."),
            "invalid blob reference: {blob_ref}"
        );

        let path = self.path_for(blob_ref);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read blob {}", path.display()))
    }
}

/// In-memory blob store for tests, with an optional failure switch so
/// resilience paths can be exercised.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_fetches: Mutex<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail, simulating an unreachable store.
    pub fn set_fail_fetches(&self, fail: bool) {
        *self.fail_fetches.lock().expect("blob store lock poisoned") = fail;
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: &[u8]) -> Result<String> {
        let key = uuid::Uuid::now_v7().to_string();
        self.blobs
            .lock()
            .expect("blob store lock poisoned")
            .insert(key.clone(), bytes.to_vec());
        Ok(key)
    }

    async fn get(&self, blob_ref: &str) -> Result<Vec<u8>> {
        if *self.fail_fetches.lock().expect("blob store lock poisoned") {
            anyhow::bail!("blob store unavailable");
        }
        self.blobs
            .lock()
            .expect("blob store lock poisoned")
            .get(blob_ref)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("blob not found: {blob_ref}"))
    }
}
