use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TwinConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// Directory for locally stored encrypted blobs.
    pub blob_dir: String,
    /// Name of the env var holding the base64-encoded 32-byte AES key.
    pub encryption_key_env: String,
}

/// Chat-completion backend (OpenAI-compatible `/chat/completions`).
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

/// Embedding backend (OpenAI-compatible `/embeddings`).
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub dimensions: usize,
}

/// Retrieval and ranking knobs.
///
/// The per-source bonuses are heuristic weights, not load-bearing constants —
/// the ordering properties hold for any non-negative values.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Final candidate cap after merge.
    pub max_candidates: usize,
    /// k for the vector index nearest-neighbor search.
    pub vector_k: usize,
    /// Score bonus for vector-index hits.
    pub vector_bonus: f64,
    /// Score bonus for encrypted records containing a query keyword verbatim.
    pub encrypted_keyword_bonus: f64,
    /// Score bonus for keyword/tag-matched records.
    pub tag_bonus: f64,
    /// Minimum lexical score for an encrypted record without a keyword hit.
    pub min_encrypted_score: f64,
    /// Row cap for the keyword/tag source.
    pub keyword_limit: usize,
    /// Number of recent chat turns included in the context.
    pub history_window: usize,
    /// Chunk size (characters) for the embedding splitter.
    pub chunk_size: usize,
    /// Chunk overlap (characters) for the embedding splitter.
    pub chunk_overlap: usize,
    /// Maximum number of per-user vector indices held in memory.
    pub index_cache_size: usize,
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5050,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_twinvault_dir()
            .join("twinvault.db")
            .to_string_lossy()
            .into_owned();
        let blob_dir = default_twinvault_dir()
            .join("blobs")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            blob_dir,
            encryption_key_env: "TWINVAULT_ENCRYPTION_KEY".into(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".into(),
            model: "llama-3.3-70b-versatile".into(),
            api_key_env: "GROQ_API_KEY".into(),
            timeout_secs: 30,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "http".into(),
            base_url: "http://localhost:11434/v1".into(),
            model: "all-minilm".into(),
            api_key_env: "TWINVAULT_EMBED_API_KEY".into(),
            timeout_secs: 30,
            dimensions: 384,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_candidates: 8,
            vector_k: 8,
            vector_bonus: 0.3,
            encrypted_keyword_bonus: 0.2,
            tag_bonus: 0.15,
            min_encrypted_score: 0.05,
            keyword_limit: 10,
            history_window: 8,
            chunk_size: 500,
            chunk_overlap: 50,
            index_cache_size: 64,
        }
    }
}

/// Returns `~/.twinvault/`
pub fn default_twinvault_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".twinvault")
}

/// Returns the default config file path: `~/.twinvault/config.toml`
pub fn default_config_path() -> PathBuf {
    default_twinvault_dir().join("config.toml")
}

impl TwinConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            TwinConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (TWINVAULT_DB, TWINVAULT_PORT, TWINVAULT_LOG_LEVEL, TWINVAULT_LLM_URL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TWINVAULT_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("TWINVAULT_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("TWINVAULT_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("TWINVAULT_LLM_URL") {
            self.llm.base_url = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Resolve the blob directory, expanding `~` if needed.
    pub fn resolved_blob_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.blob_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
