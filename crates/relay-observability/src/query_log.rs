//! Query performance logging: task type, processor, outcome, latency,
//! evidence count, and plan cache reuse.

use std::collections::VecDeque;
use std::time::Duration;

use relay_core::config::defaults;
use relay_core::models::{ProcessorKind, QueryStatus, TaskType};
use serde::{Deserialize, Serialize};

/// A single query log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query_id: String,
    pub query_text: String,
    pub task_type: Option<TaskType>,
    pub processor: ProcessorKind,
    pub status: QueryStatus,
    pub latency: Duration,
    pub context_count: usize,
    pub plan_cached: bool,
    pub timestamp_epoch_ms: i64,
}

impl QueryLogEntry {
    /// Create a new entry with the timestamp set to now.
    pub fn new(
        query_id: impl Into<String>,
        task_type: Option<TaskType>,
        processor: ProcessorKind,
        status: QueryStatus,
        latency: Duration,
        context_count: usize,
        plan_cached: bool,
    ) -> Self {
        Self {
            query_id: query_id.into(),
            query_text: String::new(),
            task_type,
            processor,
            status,
            latency,
            context_count,
            plan_cached,
            timestamp_epoch_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_query_text(mut self, text: impl Into<String>) -> Self {
        self.query_text = text.into();
        self
    }
}

/// Bounded query log; the oldest entries fall off first.
#[derive(Debug, Clone)]
pub struct QueryLog {
    entries: VecDeque<QueryLogEntry>,
    max_entries: usize,
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::with_capacity(defaults::DEFAULT_QUERY_LOG_CAPACITY)
    }
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a custom capacity.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Record a query.
    pub fn record(&mut self, entry: QueryLogEntry) {
        tracing::debug!(
            event = "query_logged",
            query_id = %entry.query_id,
            task_type = ?entry.task_type,
            processor = entry.processor.as_str(),
            status = entry.status.as_str(),
            latency_ms = u64::try_from(entry.latency.as_millis()).unwrap_or(u64::MAX),
            context_count = entry.context_count,
            plan_cached = entry.plan_cached,
            "query logged"
        );

        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &QueryLogEntry> {
        self.entries.iter()
    }

    /// Average latency across all logged queries.
    pub fn avg_latency(&self) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.entries.iter().map(|e| e.latency).sum();
        total / u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }

    /// Latency at the given percentile (0.0 to 1.0).
    pub fn latency_percentile(&self, p: f64) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let mut latencies: Vec<Duration> = self.entries.iter().map(|e| e.latency).collect();
        latencies.sort();
        let last = latencies.len() - 1;
        let idx = ((p.clamp(0.0, 1.0) * last as f64).round() as usize).min(last);
        latencies[idx]
    }

    /// Fraction of logged queries that ended FAILED.
    pub fn failure_rate(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let failed = self
            .entries
            .iter()
            .filter(|e| e.status == QueryStatus::Failed)
            .count();
        failed as f64 / self.entries.len() as f64
    }

    /// Fraction of logged queries whose plan came from the plan cache.
    pub fn plan_cache_hit_rate(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let hits = self.entries.iter().filter(|e| e.plan_cached).count();
        hits as f64 / self.entries.len() as f64
    }

    /// Total number of logged queries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}
