use serde::{Deserialize, Serialize};

use super::defaults;

/// Task plan cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Minimum cosine similarity for a cached plan to be reused.
    pub similarity_threshold: f64,
    /// Number of leading embedding dimensions in the bucket key.
    pub bucket_dims: usize,
    /// Max plans per bucket; the oldest is evicted first.
    pub bucket_capacity: usize,
    /// Max plans across all buckets.
    pub max_entries: usize,
    pub ttl_secs: u64,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: defaults::DEFAULT_PLAN_SIMILARITY_THRESHOLD,
            bucket_dims: defaults::DEFAULT_PLAN_BUCKET_DIMS,
            bucket_capacity: defaults::DEFAULT_PLAN_BUCKET_CAPACITY,
            max_entries: defaults::DEFAULT_PLAN_CACHE_MAX_ENTRIES,
            ttl_secs: defaults::DEFAULT_PLAN_TTL_SECS,
        }
    }
}

impl PlanningConfig {
    pub fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl_secs.saturating_mul(1_000)).unwrap_or(i64::MAX)
    }
}
