use serde::{Deserialize, Serialize};

use super::defaults;

/// Embedding cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// In-memory cache max entries.
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
    pub cache_idle_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            cache_capacity: defaults::DEFAULT_EMBEDDING_CACHE_CAPACITY,
            cache_ttl_secs: defaults::DEFAULT_EMBEDDING_CACHE_TTL_SECS,
            cache_idle_secs: defaults::DEFAULT_EMBEDDING_CACHE_IDLE_SECS,
        }
    }
}
