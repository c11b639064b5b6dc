//! TaskPlanCache: reuse of previously computed plans for similar queries.
//!
//! Plans are bucketed by a coarse key built from the leading embedding
//! dimensions, then matched by cosine similarity inside the bucket. Each
//! bucket is bounded (oldest evicted first), the whole cache is bounded
//! (buckets with the oldest entry evicted first), and entries expire
//! lazily after the configured TTL.
//!
//! Bucket mutations happen under the DashMap shard lock, so concurrent
//! readers see a bucket either before or after an insert or trim.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use relay_core::config::PlanningConfig;
use relay_core::models::TaskPlan;
use relay_core::similarity::cosine_similarity;
use relay_core::traits::IClock;
use relay_observability::tracing_setup::events;
use tracing::debug;

/// An immutable cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTaskPlan {
    pub query_text: String,
    pub vector: Vec<f32>,
    pub plan: TaskPlan,
    pub created_at_ms: i64,
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanHit {
    pub plan: TaskPlan,
    pub similarity: f64,
    /// The query the plan was computed for.
    pub query_text: String,
}

/// Counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

/// Coarse bucket key: the first `dims` components rounded to two decimals.
pub fn bucket_key(vector: &[f32], dims: usize) -> String {
    vector
        .iter()
        .take(dims)
        .map(|x| {
            let s = format!("{x:.2}");
            // -0.00 and 0.00 share a bucket.
            if s == "-0.00" {
                "0.00".to_string()
            } else {
                s
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub struct TaskPlanCache {
    buckets: DashMap<String, Vec<Arc<CachedTaskPlan>>>,
    clock: Arc<dyn IClock>,
    config: PlanningConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
}

impl TaskPlanCache {
    pub fn new(config: PlanningConfig, clock: Arc<dyn IClock>) -> Self {
        Self {
            buckets: DashMap::new(),
            clock,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    fn is_expired(&self, entry: &CachedTaskPlan, now_ms: i64) -> bool {
        now_ms.saturating_sub(entry.created_at_ms) >= self.config.ttl_millis()
    }

    /// Best live entry in the vector's bucket with similarity at or above
    /// the threshold.
    pub fn lookup(&self, vector: &[f32]) -> Option<PlanHit> {
        if vector.is_empty() || vector.iter().any(|x| !x.is_finite()) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let now = self.clock.now_millis();
        let key = bucket_key(vector, self.config.bucket_dims);

        let best = self.buckets.get(&key).and_then(|bucket| {
            let best = bucket
                .iter()
                .filter(|e| !self.is_expired(e, now))
                .map(|e| (cosine_similarity(vector, &e.vector), e))
                .filter(|(sim, _)| *sim >= self.config.similarity_threshold)
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(similarity, e)| PlanHit {
                    plan: e.plan.clone(),
                    similarity,
                    query_text: e.query_text.clone(),
                });
            best
        });

        match &best {
            Some(hit) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                events::plan_cache_hit(hit.similarity, &key);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        best
    }

    /// Store a plan, then trim its bucket, purge expired entries and
    /// enforce the global bound.
    pub fn insert(&self, query_text: &str, vector: Vec<f32>, plan: TaskPlan) {
        if vector.is_empty() {
            return;
        }
        let now = self.clock.now_millis();
        let key = bucket_key(&vector, self.config.bucket_dims);
        let entry = Arc::new(CachedTaskPlan {
            query_text: query_text.to_string(),
            vector,
            plan,
            created_at_ms: now,
        });

        let trimmed = {
            let mut bucket = self.buckets.entry(key).or_default();
            bucket.push(entry);
            let mut trimmed = 0u64;
            while bucket.len() > self.config.bucket_capacity {
                let oldest = bucket
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, e)| e.created_at_ms)
                    .map(|(i, _)| i);
                match oldest {
                    Some(i) => {
                        bucket.remove(i);
                        trimmed += 1;
                    }
                    None => break,
                }
            }
            trimmed
        };
        self.inserts.fetch_add(1, Ordering::Relaxed);
        self.evictions.fetch_add(trimmed, Ordering::Relaxed);

        self.purge_expired();
        self.enforce_bound();
    }

    /// Drop every expired entry and any bucket left empty. Returns the
    /// number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut removed = 0usize;
        self.buckets.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|e| !self.is_expired(e, now));
            removed += before - entries.len();
            !entries.is_empty()
        });
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "expired cached plans purged");
        }
        removed
    }

    /// Remove whole buckets, oldest minimum timestamp first, until the
    /// entry count is within `max_entries`.
    fn enforce_bound(&self) {
        while self.len() > self.config.max_entries {
            // Collect first: removing while an iterator holds a shard lock deadlocks.
            let oldest = self
                .buckets
                .iter()
                .filter_map(|b| {
                    b.value()
                        .iter()
                        .map(|e| e.created_at_ms)
                        .min()
                        .map(|ts| (ts, b.key().clone()))
                })
                .min();
            let Some((_, key)) = oldest else {
                break;
            };
            if let Some((_, entries)) = self.buckets.remove(&key) {
                self.evictions
                    .fetch_add(entries.len() as u64, Ordering::Relaxed);
                debug!(bucket = %key, entries = entries.len(), "plan cache bucket evicted");
            }
        }
    }

    /// Total cached entries across buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Entries in the bucket `vector` maps to, oldest first.
    pub fn bucket_entries(&self, vector: &[f32]) -> Vec<Arc<CachedTaskPlan>> {
        let key = bucket_key(vector, self.config.bucket_dims);
        let mut entries = self
            .buckets
            .get(&key)
            .map(|b| b.value().clone())
            .unwrap_or_default();
        entries.sort_by_key(|e| e.created_at_ms);
        entries
    }

    pub fn stats(&self) -> PlanCacheStats {
        PlanCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.buckets.clear();
    }
}
