//! Stages shared by every processor, and the failure boundary around them.
//!
//! register → route → begin → gather (processor) → generate → evaluate →
//! complete. Any error before completion marks the query and response
//! FAILED, persists both best effort, and ends the run. Evaluation errors
//! never get that far: they are retried per strategy and then replaced by
//! neutral scores.
//!
//! A non-BASIC answer scored below threshold is regenerated once through
//! BASIC when the strategy allows a retry. The better scoring answer wins.

use std::sync::Arc;

use relay_core::blocking::call_blocking;
use relay_core::config::TimeoutConfig;
use relay_core::errors::{RelayError, RelayResult};
use relay_core::models::{
    EvaluationScores, ProcessorKind, QueryStatus, RetrievedContext, SourceRef,
};
use relay_core::traits::{IClock, IEvaluator, IGenerator, IQueryRepository, IResponseRepository};
use relay_observability::pipeline_span;
use relay_observability::tracing_setup::events;
use relay_retrieval::{RetrievalEngine, RetrievalOutcome};
use serde_json::Value;
use tracing::{debug, warn, Instrument};

use crate::execution::{QueryExecution, Stage};
use crate::processors::{BasicProcessor, IQueryProcessor};

pub struct PipelineStages {
    retrieval: RetrievalEngine,
    generator: Arc<dyn IGenerator>,
    evaluator: Arc<dyn IEvaluator>,
    queries: Arc<dyn IQueryRepository>,
    responses: Arc<dyn IResponseRepository>,
    clock: Arc<dyn IClock>,
    timeouts: TimeoutConfig,
}

impl PipelineStages {
    pub fn new(
        retrieval: RetrievalEngine,
        generator: Arc<dyn IGenerator>,
        evaluator: Arc<dyn IEvaluator>,
        queries: Arc<dyn IQueryRepository>,
        responses: Arc<dyn IResponseRepository>,
        clock: Arc<dyn IClock>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            retrieval,
            generator,
            evaluator,
            queries,
            responses,
            clock,
            timeouts,
        }
    }

    /// Run one query through `route`. Never fails: the returned execution
    /// holds a COMPLETED or FAILED response.
    pub async fn run(
        &self,
        route: RelayResult<Arc<dyn IQueryProcessor>>,
        mut exec: QueryExecution,
    ) -> QueryExecution {
        let span = pipeline_span!(exec.query.id, exec.strategy.processor);
        async move {
            if let Err(e) = self.execute(route, &mut exec).await {
                self.fail(&mut exec, &e).await;
            }
            exec
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        route: RelayResult<Arc<dyn IQueryProcessor>>,
        exec: &mut QueryExecution,
    ) -> RelayResult<()> {
        exec.enter(Stage::Persistence);
        self.register(exec).await?;

        exec.enter(Stage::Routing);
        let processor = route?;
        if processor.kind() != exec.strategy.processor {
            reroute(exec, processor.kind());
        }

        exec.enter(Stage::Persistence);
        exec.query.mark_processing(processor.kind());
        self.update_status(exec, None).await?;
        self.save_response(exec).await?;

        let contexts = processor.gather(self, exec).await?;
        let evaluate = processor.always_evaluates() || exec.strategy.evaluation.enabled;
        let mut draft = self.draft(exec, contexts, evaluate).await?;
        if draft.below_threshold
            && processor.kind() != ProcessorKind::Basic
            && exec.strategy.evaluation.max_retry > 0
        {
            draft = self.downgrade(exec, draft).await;
        }
        apply(exec, draft);
        self.complete(exec).await
    }

    /// Persist the CREATED query and stamp intent metadata on the response.
    async fn register(&self, exec: &mut QueryExecution) -> RelayResult<()> {
        let queries = Arc::clone(&self.queries);
        let query = exec.query.clone();
        call_blocking("persistence", self.timeouts.persistence(), move || {
            queries.save_query(&query)
        })
        .await?;

        exec.annotate("task_type", exec.intent.task_type.as_str());
        exec.annotate("intent_source", label(&exec.intent.source));
        exec.annotate("intent_confidence", exec.intent.confidence);
        exec.annotate("clarification_required", exec.strategy.clarification_required);
        exec.annotate("plan_cached", exec.plan_cached);
        Ok(())
    }

    /// The query vector, computed once per execution.
    pub async fn embed(&self, exec: &mut QueryExecution) -> RelayResult<Vec<f32>> {
        exec.enter(Stage::Embedding);
        if let Some(v) = exec.query.vector.as_ref().filter(|v| !v.is_empty()) {
            return Ok(v.clone());
        }
        let vector = self.retrieval.embed(&exec.query.text).await?;
        exec.query.vector = Some(vector.clone());
        Ok(vector)
    }

    /// Retrieve evidence for `text` with the execution's parameters.
    pub async fn retrieve(
        &self,
        exec: &mut QueryExecution,
        text: &str,
        vector: Option<Vec<f32>>,
    ) -> RelayResult<RetrievalOutcome> {
        exec.enter(Stage::Retrieval);
        let outcome = self.retrieval.retrieve(text, vector, &exec.params).await?;
        let raw_hits = exec
            .response
            .metadata
            .get("raw_hits")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        exec.annotate("raw_hits", raw_hits + outcome.raw_hits as u64);
        if outcome.relaxed {
            exec.annotate("relaxed_retrieval", true);
        }
        Ok(outcome)
    }

    /// Generate an answer from `contexts` and score it when `evaluate`.
    async fn draft(
        &self,
        exec: &mut QueryExecution,
        contexts: Vec<RetrievedContext>,
        evaluate: bool,
    ) -> RelayResult<Draft> {
        let sources = contexts.iter().map(SourceRef::from_context).collect();
        let texts: Vec<String> = contexts.iter().map(|c| c.chunk.content.clone()).collect();

        exec.enter(Stage::Generation);
        let generator = Arc::clone(&self.generator);
        let query = exec.query.text.clone();
        let generation = exec.strategy.generation.clone();
        let context_texts = texts.clone();
        let answer = call_blocking("generation", self.timeouts.generation(), move || {
            generator.generate(&query, &context_texts, &generation)
        })
        .await?;
        debug!(chars = answer.len(), "answer generated");

        let mut draft = Draft {
            answer,
            sources,
            context_count: texts.len(),
            scores: None,
            below_threshold: false,
        };
        if evaluate {
            exec.enter(Stage::Evaluation);
            let scores = self.evaluate(exec, &draft.answer, texts.join("\n\n")).await;
            let strategy = &exec.strategy.evaluation;
            draft.below_threshold = !scores.is_neutral_fallback()
                && (scores.faithfulness_ratio() < strategy.min_faithfulness
                    || scores.relevance_ratio() < strategy.min_relevance);
            draft.scores = Some(scores);
        }
        Ok(draft)
    }

    /// Regenerate through BASIC and keep whichever answer scores higher.
    /// A failed BASIC run keeps the original answer.
    async fn downgrade(&self, exec: &mut QueryExecution, original: Draft) -> Draft {
        let from = exec.response.processing_type;
        debug!(from = from.as_str(), "answer below threshold, retrying through BASIC");
        exec.annotate("downgraded_from", from.as_str());

        let retry = match BasicProcessor.gather(self, exec).await {
            Ok(contexts) => self.draft(exec, contexts, true).await,
            Err(e) => Err(e),
        };
        let kept = match retry {
            Ok(retry) if retry.outscores(&original) => Some(retry),
            Ok(_) => None,
            Err(e) => {
                warn!(
                    query_id = %exec.query.id,
                    error = %e,
                    "BASIC retry failed, keeping original answer"
                );
                None
            }
        };
        exec.annotate("downgrade_kept", kept.is_some());
        match kept {
            Some(retry) => {
                exec.response.processing_type = ProcessorKind::Basic;
                exec.query.processing_type = Some(ProcessorKind::Basic);
                retry
            }
            None => original,
        }
    }

    /// Up to `attempts()` evaluation calls; neutral scores when all fail.
    async fn evaluate(
        &self,
        exec: &QueryExecution,
        answer: &str,
        context: String,
    ) -> EvaluationScores {
        let attempts = exec.strategy.evaluation.attempts();
        let mut last_error: Option<RelayError> = None;
        for attempt in 1..=attempts {
            let evaluator = Arc::clone(&self.evaluator);
            let query = exec.query.text.clone();
            let answer = answer.to_string();
            let context = context.clone();
            let result = call_blocking("evaluation", self.timeouts.evaluation(), move || {
                evaluator.evaluate(&query, &answer, &context)
            })
            .await;
            match result {
                Ok(scores) => return scores,
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "evaluation failed");
                    last_error = Some(e);
                }
            }
        }
        let message = last_error.map_or_else(
            || "evaluation not attempted".to_string(),
            |e| e.to_string(),
        );
        events::degradation_triggered("evaluation", &message, "neutral scores");
        EvaluationScores::neutral(message)
    }

    async fn complete(&self, exec: &mut QueryExecution) -> RelayResult<()> {
        exec.enter(Stage::Completion);
        let now = self.clock.now_millis();
        let latency = exec.latency_ms();
        exec.query.mark_completed(now, latency);
        exec.response.status = QueryStatus::Completed;
        exec.response.latency_ms = latency;
        self.update_status(exec, None).await?;
        self.save_response(exec).await?;
        events::query_completed(
            &exec.query.id,
            exec.response.processing_type.as_str(),
            exec.response.sources.len(),
            latency,
        );
        Ok(())
    }

    /// Mark the query and response FAILED and persist both. Persistence
    /// errors here are logged and dropped.
    pub async fn fail(&self, exec: &mut QueryExecution, error: &RelayError) {
        let message = error.to_string();
        let now = self.clock.now_millis();
        let latency = exec.latency_ms();
        exec.query.mark_failed(message.clone(), now, latency);
        exec.response.mark_failed(message.clone(), latency);
        exec.annotate("failed_stage", exec.stage.as_str());

        if let Err(e) = self.update_status(exec, Some(message.clone())).await {
            warn!(query_id = %exec.query.id, error = %e, "failed to persist FAILED query status");
        }
        if let Err(e) = self.save_response(exec).await {
            warn!(query_id = %exec.query.id, error = %e, "failed to persist FAILED response");
        }
        events::query_failed(&exec.query.id, exec.stage.as_str(), &message);
    }

    async fn update_status(
        &self,
        exec: &QueryExecution,
        error: Option<String>,
    ) -> RelayResult<()> {
        let queries = Arc::clone(&self.queries);
        let id = exec.query.id.clone();
        let status = exec.query.status;
        let completed_at = exec.query.completed_at_ms;
        let latency = exec.query.latency_ms;
        call_blocking("persistence", self.timeouts.persistence(), move || {
            queries.update_query_status(&id, status, completed_at, latency, error.as_deref())
        })
        .await
    }

    async fn save_response(&self, exec: &QueryExecution) -> RelayResult<()> {
        let responses = Arc::clone(&self.responses);
        let response = exec.response.clone();
        call_blocking("persistence", self.timeouts.persistence(), move || {
            responses.save_response(&response)
        })
        .await
    }
}

/// A generated answer and, when evaluated, its scores.
struct Draft {
    answer: String,
    sources: Vec<SourceRef>,
    context_count: usize,
    scores: Option<EvaluationScores>,
    below_threshold: bool,
}

impl Draft {
    fn outscores(&self, other: &Draft) -> bool {
        match (&self.scores, &other.scores) {
            (Some(mine), Some(theirs)) => {
                !mine.is_neutral_fallback() && mine.total_score > theirs.total_score
            }
            _ => false,
        }
    }
}

fn apply(exec: &mut QueryExecution, draft: Draft) {
    exec.annotate("context_count", draft.context_count);
    exec.response.sources = draft.sources;
    exec.response.answer = Some(draft.answer);
    match draft.scores {
        Some(scores) => {
            exec.annotate("evaluation_mode", label(&exec.strategy.evaluation.mode));
            exec.annotate("evaluation_below_threshold", draft.below_threshold);
            exec.response.evaluation = Some(scores);
        }
        None => exec.annotate("evaluation_skipped", true),
    }
}

/// The router served `served` in place of the requested selector.
fn reroute(exec: &mut QueryExecution, served: ProcessorKind) {
    let requested = exec.strategy.processor;
    warn!(
        query_id = %exec.query.id,
        requested = requested.as_str(),
        served = served.as_str(),
        "no processor for selector, using default"
    );
    exec.annotate("requested_processor", requested.as_str());
    exec.annotate("route_fallback", true);
    exec.strategy.processor = served;
    exec.response.processing_type = served;
}

/// Serialized label of an enum value, e.g. `RULE_BASED`.
fn label<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
