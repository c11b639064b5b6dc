//! Per-query execution state, owned by one pipeline run.

use std::fmt;
use std::time::{Duration, Instant};

use relay_core::models::{Query, QueryIntent, Response, RetrievalParams};

use crate::strategy::QueryStrategy;

/// Pipeline stage, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Routing,
    Persistence,
    Embedding,
    Planning,
    Retrieval,
    Generation,
    Evaluation,
    Completion,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routing => "routing",
            Self::Persistence => "persistence",
            Self::Embedding => "embedding",
            Self::Planning => "planning",
            Self::Retrieval => "retrieval",
            Self::Generation => "generation",
            Self::Evaluation => "evaluation",
            Self::Completion => "completion",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct QueryExecution {
    pub query: Query,
    pub response: Response,
    pub intent: QueryIntent,
    pub strategy: QueryStrategy,
    pub params: RetrievalParams,
    /// The task plan came from the plan cache.
    pub plan_cached: bool,
    /// Stage currently running; a failure is attributed to it.
    pub stage: Stage,
    started: Instant,
}

impl QueryExecution {
    pub fn new(
        query: Query,
        intent: QueryIntent,
        strategy: QueryStrategy,
        params: RetrievalParams,
        now_ms: i64,
    ) -> Self {
        let response = Response::processing(&query, strategy.processor, now_ms);
        Self {
            query,
            response,
            intent,
            strategy,
            params,
            plan_cached: false,
            stage: Stage::Routing,
            started: Instant::now(),
        }
    }

    pub fn enter(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn latency_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Attach a metadata value to the response.
    pub fn annotate(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.response.metadata.insert(key.to_string(), value.into());
    }
}
