use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Per-capability timeouts for blocking external calls, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub embedding_ms: u64,
    pub vector_search_ms: u64,
    pub generation_ms: u64,
    pub evaluation_ms: u64,
    pub planner_ms: u64,
    pub persistence_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embedding_ms: defaults::DEFAULT_EMBEDDING_TIMEOUT_MS,
            vector_search_ms: defaults::DEFAULT_VECTOR_SEARCH_TIMEOUT_MS,
            generation_ms: defaults::DEFAULT_GENERATION_TIMEOUT_MS,
            evaluation_ms: defaults::DEFAULT_EVALUATION_TIMEOUT_MS,
            planner_ms: defaults::DEFAULT_PLANNER_TIMEOUT_MS,
            persistence_ms: defaults::DEFAULT_PERSISTENCE_TIMEOUT_MS,
        }
    }
}

impl TimeoutConfig {
    pub fn embedding(&self) -> Duration {
        Duration::from_millis(self.embedding_ms)
    }

    pub fn vector_search(&self) -> Duration {
        Duration::from_millis(self.vector_search_ms)
    }

    pub fn generation(&self) -> Duration {
        Duration::from_millis(self.generation_ms)
    }

    pub fn evaluation(&self) -> Duration {
        Duration::from_millis(self.evaluation_ms)
    }

    pub fn planner(&self) -> Duration {
        Duration::from_millis(self.planner_ms)
    }

    pub fn persistence(&self) -> Duration {
        Duration::from_millis(self.persistence_ms)
    }
}
