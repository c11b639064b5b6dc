//! TaskPlanner: plan cache in front of the language-model planner.

use std::sync::Arc;

use relay_core::blocking::call_blocking;
use relay_core::config::TimeoutConfig;
use relay_core::errors::{CacheError, RelayError, RelayResult};
use relay_core::models::{QueryIntent, TaskPlan};
use relay_core::traits::{IEmbeddingProvider, ILanguageModelPlanner};
use relay_observability::planning_span;
use relay_observability::tracing_setup::events;
use tracing::{debug, info, Instrument};

use crate::cache::{PlanHit, TaskPlanCache};
use crate::dag::validate_plan;

/// Result of [`TaskPlanner::plan_tasks`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub plan: TaskPlan,
    /// Served from the plan cache.
    pub cached: bool,
    /// Similarity of the cached entry, when `cached`.
    pub similarity: Option<f64>,
}

pub struct TaskPlanner {
    embedder: Arc<dyn IEmbeddingProvider>,
    planner: Arc<dyn ILanguageModelPlanner>,
    cache: Arc<TaskPlanCache>,
    timeouts: TimeoutConfig,
}

impl TaskPlanner {
    pub fn new(
        embedder: Arc<dyn IEmbeddingProvider>,
        planner: Arc<dyn ILanguageModelPlanner>,
        cache: Arc<TaskPlanCache>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            embedder,
            planner,
            cache,
            timeouts,
        }
    }

    pub fn cache(&self) -> &Arc<TaskPlanCache> {
        &self.cache
    }

    /// Plan a multi-step intent, reusing a cached plan for a similar query.
    ///
    /// Single-step intents return their attached plan (or an empty one)
    /// without touching the cache or the planner. Cache failures degrade to
    /// a miss; planner failures and invalid plans are returned as errors.
    pub async fn plan_tasks(&self, query: &str, intent: &QueryIntent) -> RelayResult<PlanOutcome> {
        if !intent.multi_step {
            debug!("single-step intent, planning skipped");
            return Ok(PlanOutcome {
                plan: intent.task_plan.clone().unwrap_or_default(),
                cached: false,
                similarity: None,
            });
        }
        let span = planning_span!(intent.task_type);
        self.plan_with_cache(query, intent)
            .instrument(span)
            .await
    }

    async fn plan_with_cache(
        &self,
        query: &str,
        intent: &QueryIntent,
    ) -> RelayResult<PlanOutcome> {
        let vector = self.cache_key(query).await;
        if let Some(hit) = vector.as_deref().and_then(|v| self.cache.lookup(v)) {
            info!(
                similarity = hit.similarity,
                cached_query = %hit.query_text,
                "reusing cached plan"
            );
            return Ok(PlanOutcome {
                plan: hit.plan,
                cached: true,
                similarity: Some(hit.similarity),
            });
        }

        let planner = Arc::clone(&self.planner);
        let query_owned = query.to_string();
        let intent_owned = intent.clone();
        let plan = call_blocking("planner", self.timeouts.planner(), move || {
            planner.plan(&query_owned, &intent_owned)
        })
        .await?;
        validate_plan(&plan)?;
        info!(tasks = plan.tasks.len(), "plan computed");

        if let Some(v) = vector {
            if plan.has_tasks() {
                self.cache.insert(query, v, plan.clone());
            }
        }
        Ok(PlanOutcome {
            plan,
            cached: false,
            similarity: None,
        })
    }

    /// Cached plan for `query`, if any. Failures read as a miss.
    pub async fn cached_plan(&self, query: &str) -> Option<PlanHit> {
        let vector = self.cache_key(query).await?;
        self.cache.lookup(&vector)
    }

    /// Remember a plan produced elsewhere (for example by classification).
    /// Empty or invalid plans are ignored.
    pub async fn remember(&self, query: &str, plan: &TaskPlan) {
        if !plan.has_tasks() || validate_plan(plan).is_err() {
            return;
        }
        if let Some(v) = self.cache_key(query).await {
            self.cache.insert(query, v, plan.clone());
        }
    }

    async fn cache_key(&self, query: &str) -> Option<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let result = call_blocking("embedding", self.timeouts.embedding(), move || {
            embedder.embed(&text)
        })
        .await;
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                let err = RelayError::from(CacheError::KeyEmbeddingFailed {
                    reason: e.to_string(),
                });
                events::degradation_triggered("plan_cache", &err.to_string(), "cache miss");
                None
            }
        }
    }
}
