//! IntentCascade: runs the detectors in precedence order over an immutable
//! index snapshot and picks the final intent.
//!
//! Order is fixed: rule-based, semantic router, language-model planner. A
//! `Locked` or `StopCascade` detection ends the pass with its candidate.
//! Otherwise the most confident candidate wins, ties going to the earlier
//! detector, and with no candidate at all the FALLBACK intent is used.
//! Detection never fails: a detector error is recorded and skipped.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use relay_core::blocking::call_blocking;
use relay_core::config::{IntentConfig, TimeoutConfig};
use relay_core::errors::RelayResult;
use relay_core::models::{QueryIntent, RoutingDecision, RuleType};
use relay_core::traits::{IClock, IEmbeddingProvider, IIntentRuleRepository, ILanguageModelPlanner};
use relay_observability::intent_span;
use relay_observability::tracing_setup::events;
use relay_observability::{DecisionRecorder, PublisherSet};
use relay_planning::TaskPlanner;
use tracing::{debug, warn, Instrument};

use crate::detectors::{
    CascadeDecision, IIntentDetector, PlannerDetector, RuleBasedDetector, SemanticDetector,
};
use crate::index::{CascadeIndex, RouteStats};
use crate::rules::{LexicalIndex, MatcherRegistry};
use crate::semantic::SemanticRouteTable;

pub struct IntentCascade {
    detectors: Vec<Arc<dyn IIntentDetector>>,
    index: RwLock<Arc<CascadeIndex>>,
    registry: MatcherRegistry,
    embedder: Arc<dyn IEmbeddingProvider>,
    publishers: PublisherSet,
    clock: Arc<dyn IClock>,
    config: IntentConfig,
    timeouts: TimeoutConfig,
}

impl IntentCascade {
    /// A cascade with an empty index. Call [`IntentCascade::refresh`] to
    /// load rules.
    pub fn new(
        config: IntentConfig,
        timeouts: TimeoutConfig,
        embedder: Arc<dyn IEmbeddingProvider>,
        planner: Arc<dyn ILanguageModelPlanner>,
        task_planner: Arc<TaskPlanner>,
        clock: Arc<dyn IClock>,
    ) -> Self {
        let detectors: Vec<Arc<dyn IIntentDetector>> = vec![
            Arc::new(RuleBasedDetector::new(config.default_rule_confidence)),
            Arc::new(SemanticDetector::new(Arc::clone(&embedder), timeouts.clone())),
            Arc::new(PlannerDetector::new(
                planner,
                task_planner,
                config.clone(),
                timeouts.clone(),
            )),
        ];
        Self {
            detectors,
            index: RwLock::new(Arc::new(CascadeIndex::default())),
            registry: MatcherRegistry::standard(),
            embedder,
            publishers: PublisherSet::with_log(),
            clock,
            config,
            timeouts,
        }
    }

    /// Replace the routing decision publishers.
    pub fn with_publishers(mut self, publishers: PublisherSet) -> Self {
        self.publishers = publishers;
        self
    }

    /// The index detections currently run against.
    pub fn snapshot(&self) -> Arc<CascadeIndex> {
        let guard = self.index.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a new index. In-flight detections keep their snapshot.
    pub fn install(&self, index: CascadeIndex) {
        let mut guard = self.index.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(index);
    }

    /// Reload lexical and semantic rules and swap in a freshly built index.
    /// The two rule fetches run concurrently; if either fails the current
    /// index stays in place and the error is returned.
    pub async fn refresh(&self, rules: Arc<dyn IIntentRuleRepository>) -> RelayResult<RouteStats> {
        let lexical_repo = Arc::clone(&rules);
        let semantic_repo = rules;
        let timeout = self.timeouts.persistence();
        let (lexical_rules, semantic_rules) = tokio::try_join!(
            call_blocking("persistence", timeout, move || {
                lexical_repo.find_active_by_types(&RuleType::LEXICAL)
            }),
            call_blocking("persistence", timeout, move || {
                semantic_repo.find_active_by_types(&[RuleType::SemanticExample])
            }),
        )?;

        let lexical = LexicalIndex::build(lexical_rules, &self.registry);
        let semantic = SemanticRouteTable::build(
            semantic_rules,
            Arc::clone(&self.embedder),
            &self.timeouts,
            self.config.semantic_threshold,
        )
        .await;
        let index = CascadeIndex {
            lexical,
            semantic,
            built_at_ms: self.clock.now_millis(),
        };
        let stats = index.stats();
        self.install(index);
        events::routes_refreshed(stats.lexical_rules, stats.semantic_routes, stats.examples);
        Ok(stats)
    }

    pub async fn detect(
        &self,
        query: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> QueryIntent {
        self.detect_with_decision(query, user_id, session_id).await.0
    }

    /// Detect and also return the routing decision that was published.
    pub async fn detect_with_decision(
        &self,
        query: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> (QueryIntent, RoutingDecision) {
        let span = intent_span!(query);
        self.run(query, user_id, session_id).instrument(span).await
    }

    async fn run(
        &self,
        query: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> (QueryIntent, RoutingDecision) {
        let index = self.snapshot();
        let mut recorder =
            DecisionRecorder::start(query, user_id, session_id, self.clock.now_millis());

        // (intent, detector name, served from the plan cache)
        let mut best: Option<(QueryIntent, &'static str, bool)> = None;
        let mut terminal: Option<(QueryIntent, String, bool)> = None;

        for detector in &self.detectors {
            let name = detector.name();
            let started = Instant::now();
            let detection = match detector.detect(query, &index).await {
                Ok(d) => d,
                Err(e) => {
                    warn!(detector = name, error = %e, "detector failed");
                    recorder.record(name, false, 0.0, format!("failed: {e}"), started.elapsed());
                    continue;
                }
            };
            recorder.record(
                name,
                detection.candidate.is_some(),
                detection.confidence(),
                detection.reason.clone(),
                started.elapsed(),
            );

            let Some(candidate) = detection.candidate else {
                continue;
            };
            match detection.decision {
                CascadeDecision::Locked => {
                    terminal = Some((candidate, format!("locked by {name}"), detection.cached));
                    break;
                }
                CascadeDecision::StopCascade => {
                    terminal = Some((
                        candidate,
                        format!("cascade stopped by {name}"),
                        detection.cached,
                    ));
                    break;
                }
                CascadeDecision::ContinueCascade => {
                    let better = best
                        .as_ref()
                        .map_or(true, |(b, _, _)| candidate.confidence > b.confidence);
                    if better {
                        best = Some((candidate, name, detection.cached));
                    }
                }
            }
        }

        let (intent, reason, cached) = match (terminal, best) {
            (Some(t), _) => t,
            (None, Some((intent, name, cached))) => {
                (intent, format!("highest confidence from {name}"), cached)
            }
            (None, None) => (
                QueryIntent::fallback(
                    query,
                    self.config.fallback_confidence,
                    self.config.long_query_chars,
                ),
                "no detector matched, fallback".to_string(),
                false,
            ),
        };
        if cached {
            recorder.mark_cached();
        }
        let decision = recorder.finish(intent.clone(), reason);
        debug!(
            source = ?intent.source,
            task_type = intent.task_type.as_str(),
            processor = intent.recommended_processor.as_str(),
            confidence = intent.confidence,
            "intent detected"
        );
        if self.config.tracking_enabled {
            self.publishers.publish(&decision);
        }
        (intent, decision)
    }
}
