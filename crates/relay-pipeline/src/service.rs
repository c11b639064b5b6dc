//! QueryService: the `ProcessQuery` and `RefreshRoutes` entry points.

use std::sync::{Arc, Mutex, MutexGuard};

use relay_core::config::RelayConfig;
use relay_core::embedding_cache::CachingEmbedder;
use relay_core::errors::RelayResult;
use relay_core::models::{
    ProcessorKind, Query, QueryIntent, QueryRequest, Response, RetrievalParams,
};
use relay_core::traits::{
    IClock, IEmbeddingProvider, IEvaluator, IGenerator, IIntentRuleRepository,
    ILanguageModelPlanner, IQueryRepository, IResponseRepository, IVectorStore,
};
use relay_intent::{IntentCascade, RouteStats};
use relay_observability::{PublisherSet, QueryLog, QueryLogEntry};
use relay_planning::{TaskPlanCache, TaskPlanner};
use relay_retrieval::RetrievalEngine;
use tracing::{debug, warn};

use crate::execution::QueryExecution;
use crate::processors::IQueryProcessor;
use crate::router::QueryRouter;
use crate::stages::PipelineStages;
use crate::strategy::StrategyMapper;

/// External collaborators the service is wired to.
pub struct Capabilities {
    pub embedder: Arc<dyn IEmbeddingProvider>,
    pub vector_store: Arc<dyn IVectorStore>,
    pub generator: Arc<dyn IGenerator>,
    pub evaluator: Arc<dyn IEvaluator>,
    pub planner: Arc<dyn ILanguageModelPlanner>,
    pub queries: Arc<dyn IQueryRepository>,
    pub responses: Arc<dyn IResponseRepository>,
    pub rules: Arc<dyn IIntentRuleRepository>,
    pub clock: Arc<dyn IClock>,
}

pub struct QueryService {
    config: RelayConfig,
    cascade: IntentCascade,
    planner: Arc<TaskPlanner>,
    mapper: StrategyMapper,
    router: QueryRouter,
    stages: PipelineStages,
    rules: Arc<dyn IIntentRuleRepository>,
    clock: Arc<dyn IClock>,
    log: Mutex<QueryLog>,
}

impl QueryService {
    /// Wire the service. The embedder is wrapped in a [`CachingEmbedder`]
    /// shared by the cascade, the planner and retrieval, so a vector
    /// computed by the semantic router is reused downstream.
    pub fn new(config: RelayConfig, caps: Capabilities) -> RelayResult<Self> {
        config.validate()?;
        let embedder: Arc<dyn IEmbeddingProvider> =
            Arc::new(CachingEmbedder::new(caps.embedder, &config.embedding));

        let cache = Arc::new(TaskPlanCache::new(
            config.planning.clone(),
            Arc::clone(&caps.clock),
        ));
        let planner = Arc::new(TaskPlanner::new(
            Arc::clone(&embedder),
            Arc::clone(&caps.planner),
            cache,
            config.timeouts.clone(),
        ));
        let cascade = IntentCascade::new(
            config.intent.clone(),
            config.timeouts.clone(),
            Arc::clone(&embedder),
            caps.planner,
            Arc::clone(&planner),
            Arc::clone(&caps.clock),
        );
        let retrieval = RetrievalEngine::new(caps.vector_store, embedder, config.timeouts.clone())
            .with_relax_on_empty(config.retrieval.relax_on_empty);
        let stages = PipelineStages::new(
            retrieval,
            caps.generator,
            caps.evaluator,
            caps.queries,
            caps.responses,
            Arc::clone(&caps.clock),
            config.timeouts.clone(),
        );

        Ok(Self {
            mapper: StrategyMapper::new(config.generation.clone(), config.evaluation.clone()),
            log: Mutex::new(QueryLog::with_capacity(
                config.observability.query_log_capacity,
            )),
            cascade,
            planner,
            router: QueryRouter::standard().with_default(config.intent.default_processor),
            stages,
            rules: caps.rules,
            clock: caps.clock,
            config,
        })
    }

    /// Replace the routing decision publishers.
    pub fn with_publishers(mut self, publishers: PublisherSet) -> Self {
        self.cascade = self.cascade.with_publishers(publishers);
        self
    }

    /// Register an additional processor.
    pub fn with_processor(mut self, processor: Arc<dyn IQueryProcessor>) -> Self {
        self.router.register(processor);
        self
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn cascade(&self) -> &IntentCascade {
        &self.cascade
    }

    pub fn task_planner(&self) -> &Arc<TaskPlanner> {
        &self.planner
    }

    /// Registered route selectors.
    pub fn routes(&self) -> Vec<ProcessorKind> {
        self.router.selectors()
    }

    /// Reload intent rules and semantic routes. Safe to call while queries
    /// are in flight; on failure the current index stays active.
    pub async fn refresh_routes(&self) -> RelayResult<RouteStats> {
        self.cascade.refresh(Arc::clone(&self.rules)).await
    }

    /// Read access to the query performance log.
    pub fn with_query_log<R>(&self, f: impl FnOnce(&QueryLog) -> R) -> R {
        f(&self.lock_log())
    }

    /// Process one query end to end.
    ///
    /// Only a malformed request is returned as `Err`, before anything is
    /// persisted. Every later failure yields a FAILED [`Response`] with an
    /// error message.
    pub async fn process_query(&self, request: QueryRequest) -> RelayResult<Response> {
        request.validate()?;
        let params = RetrievalParams::resolve(request.params.as_ref(), &self.config.retrieval)?;
        let query = Query::from_request(&request, self.clock.now_millis());

        let (intent, decision) = self
            .cascade
            .detect_with_decision(
                &query.text,
                query.user_id.as_deref(),
                query.session_id.as_deref(),
            )
            .await;
        let (intent, plan_cached) = self.attach_plan(&query.text, intent, decision.cached).await;

        let strategy = self.mapper.map(&intent, request.params.as_ref());
        debug!(
            query_id = %query.id,
            processor = %strategy.processor,
            task_type = intent.task_type.as_str(),
            "strategy selected"
        );
        let mut exec =
            QueryExecution::new(query, intent, strategy, params, self.clock.now_millis());
        exec.plan_cached = plan_cached;

        let route = self.router.route(exec.strategy.processor);
        let exec = self.stages.run(route, exec).await;
        self.record(&exec);
        Ok(exec.response)
    }

    /// Plan multi-step intents that arrive without a plan. Locked intents
    /// keep their processor, so they are only planned when locked to
    /// RAG_FUSION. A planning failure leaves the intent unplanned.
    async fn attach_plan(
        &self,
        text: &str,
        intent: QueryIntent,
        detected_from_cache: bool,
    ) -> (QueryIntent, bool) {
        let wants_plan = intent.multi_step
            && !intent.has_plan()
            && (!intent.lock_processor
                || intent.recommended_processor == ProcessorKind::RagFusion);
        if !wants_plan {
            return (intent, detected_from_cache);
        }
        match self.planner.plan_tasks(text, &intent).await {
            Ok(outcome) if outcome.plan.has_tasks() => {
                (intent.with_plan(outcome.plan), outcome.cached)
            }
            Ok(_) => (intent, false),
            Err(e) => {
                warn!(error = %e, "planning failed, continuing without a plan");
                (intent, false)
            }
        }
    }

    fn record(&self, exec: &QueryExecution) {
        let entry = QueryLogEntry::new(
            exec.query.id.clone(),
            Some(exec.intent.task_type),
            exec.strategy.processor,
            exec.response.status,
            exec.elapsed(),
            exec.response.sources.len(),
            exec.plan_cached,
        )
        .with_query_text(exec.query.text.clone());
        self.lock_log().record(entry);
    }

    fn lock_log(&self) -> MutexGuard<'_, QueryLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }
}
