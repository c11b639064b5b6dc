use std::sync::Arc;

use relay_core::config::{IntentConfig, PlanningConfig, TimeoutConfig};
use relay_core::models::{IntentSource, ProcessorKind, TaskType};
use relay_core::traits::SystemClock;
use relay_intent::IntentCascade;
use relay_observability::{ChannelPublisher, PublisherSet};
use relay_planning::{TaskPlanCache, TaskPlanner};
use test_fixtures::{load_rules, CountingPlanner, ScriptedEmbedder, StaticRuleRepository};

struct Harness {
    cascade: IntentCascade,
    embedder: Arc<ScriptedEmbedder>,
    planner: Arc<CountingPlanner>,
}

fn embedder() -> ScriptedEmbedder {
    ScriptedEmbedder::new(4)
        .with("will it rain tomorrow", vec![1.0, 0.0, 0.0, 0.0])
        .with("where is my order", vec![0.0, 1.0, 0.0, 0.0])
        .with("where is my package", vec![0.1, 0.99, 0.0, 0.0])
        .with("tell me about penguins", vec![0.0, 0.0, 1.0, 0.0])
        .with("how do I reset my router", vec![0.0, 0.0, 0.0, 1.0])
        .with("my wifi keeps dropping", vec![0.0, 0.0, 1.0, 1.0])
        .with("summarize the quarterly report", vec![1.0, 1.0, 0.0, 0.0])
        .with("what are the shipping options", vec![1.0, 0.0, 1.0, 0.0])
        .with("internet drops every evening", vec![0.0, 0.0, 0.8, 0.75])
        .with("give me the q3 report summary", vec![0.95, 1.0, 0.0, 0.0])
        .with("how much is shipping", vec![1.0, 0.0, 0.95, 0.0])
        .with(PLANNED, vec![0.0, 0.0, 0.7, 0.7])
}

const PLANNED: &str = "compare the premium and basic plans and recommend one";

async fn harness(rule_set: &str, config: IntentConfig) -> Harness {
    let embedder = Arc::new(embedder());
    let planner = Arc::new(CountingPlanner::three_step());
    let cache = Arc::new(TaskPlanCache::new(
        PlanningConfig::default(),
        Arc::new(SystemClock),
    ));
    let task_planner = Arc::new(TaskPlanner::new(
        Arc::clone(&embedder) as _,
        Arc::clone(&planner) as _,
        cache,
        TimeoutConfig::default(),
    ));
    let cascade = IntentCascade::new(
        config,
        TimeoutConfig::default(),
        Arc::clone(&embedder) as _,
        Arc::clone(&planner) as _,
        task_planner,
        Arc::new(SystemClock),
    );
    let repo = Arc::new(StaticRuleRepository::new(load_rules(rule_set)));
    cascade.refresh(repo).await.unwrap();
    Harness {
        cascade,
        embedder,
        planner,
    }
}

fn planner_off() -> IntentConfig {
    IntentConfig {
        planner_enabled: false,
        ..IntentConfig::default()
    }
}

#[tokio::test]
async fn lock_rule_short_circuits_before_any_embedding() {
    let h = harness("weather_lock", IntentConfig::default()).await;
    let embeds_after_refresh = h.embedder.embed_calls();

    let (intent, decision) = h
        .cascade
        .detect_with_decision("what's the weather in Lisbon", Some("u1"), None)
        .await;

    assert_eq!(intent.source, IntentSource::RuleBased);
    assert_eq!(intent.task_type, TaskType::Weather);
    assert_eq!(intent.recommended_processor, ProcessorKind::Basic);
    assert!(intent.lock_processor);
    assert_eq!(intent.confidence, 0.95);

    assert_eq!(decision.detector_results.len(), 1);
    assert!(decision.detector_results[0].matched);
    assert_eq!(decision.detector_results[0].detector, "rule-based");
    assert_eq!(decision.user_id.as_deref(), Some("u1"));
    assert!(!decision.cached);

    assert_eq!(h.embedder.embed_calls(), embeds_after_refresh);
    assert_eq!(h.planner.classify_calls(), 0);
}

#[tokio::test]
async fn invalid_and_inactive_rules_are_left_out_of_the_index() {
    let h = harness("cascade_mix", planner_off()).await;
    let stats = h.cascade.snapshot().stats();
    assert_eq!(stats.lexical_rules, 4);
    assert_eq!(stats.skipped_rules, 1);
    assert_eq!(stats.semantic_routes, 0);

    let intent = h.cascade.detect("this feature is deprecated", None, None).await;
    assert_eq!(intent.source, IntentSource::Fallback);
}

#[tokio::test]
async fn most_confident_lexical_match_wins() {
    let h = harness("cascade_mix", planner_off()).await;

    let intent = h.cascade.detect("compare order #12345 with the last one", None, None).await;
    assert_eq!(intent.task_type, TaskType::OrderLookup);
    assert_eq!(intent.attributes["rule_id"], "11");
    assert_eq!(intent.confidence, 0.9);

    let intent = h.cascade.detect("compare premium and basic", None, None).await;
    assert_eq!(intent.task_type, TaskType::Comparison);
    assert_eq!(intent.recommended_processor, ProcessorKind::MultiQuery);
}

#[tokio::test]
async fn suffix_rule_uses_default_confidence() {
    let h = harness("cascade_mix", planner_off()).await;
    let intent = h.cascade.detect("what is your refund policy", None, None).await;
    assert_eq!(intent.task_type, TaskType::Faq);
    assert_eq!(intent.confidence, IntentConfig::default().default_rule_confidence);
}

#[tokio::test]
async fn no_cascade_rule_stops_before_the_planner() {
    let h = harness("cascade_mix", IntentConfig::default()).await;
    let (intent, decision) = h.cascade.detect_with_decision("help", None, None).await;

    assert_eq!(intent.task_type, TaskType::Chat);
    assert!(!intent.allow_cascade);
    assert_eq!(decision.detector_results.len(), 1);
    assert!(decision.reason.contains("stopped"));
    assert_eq!(h.planner.classify_calls(), 0);
}

#[tokio::test]
async fn planner_beats_a_weaker_rule_candidate() {
    let h = harness("cascade_mix", IntentConfig::default()).await;
    let (intent, decision) = h
        .cascade
        .detect_with_decision("compare premium and basic plans for a team of five", None, None)
        .await;

    assert_eq!(intent.source, IntentSource::LlmPlanner);
    assert!(intent.multi_step);
    assert_eq!(intent.recommended_processor, ProcessorKind::RagFusion);
    assert_eq!(intent.task_plan.as_ref().map(|p| p.tasks.len()), Some(3));
    assert_eq!(intent.attributes["planner_model"], "llm");
    assert_eq!(decision.detector_results.len(), 3);
    assert_eq!(decision.matched_detectors().count(), 2);
    assert_eq!(h.planner.classify_calls(), 1);
}

#[tokio::test]
async fn semantic_route_matches_a_paraphrase() {
    let h = harness("weather_lock", planner_off()).await;
    let intent = h.cascade.detect("where is my package", None, None).await;

    assert_eq!(intent.source, IntentSource::SemanticRouter);
    assert_eq!(intent.task_type, TaskType::OrderLookup);
    assert_eq!(intent.attributes["route_key"], "ORDER_STATUS");
    assert!(intent.confidence > 0.99);
}

#[tokio::test]
async fn route_threshold_comes_from_its_highest_priority_rule() {
    let h = harness("semantic_routes", planner_off()).await;
    let network = h
        .cascade
        .snapshot()
        .semantic
        .routes()
        .iter()
        .find(|r| r.key == "NETWORK_TROUBLESHOOT")
        .map(|r| (r.threshold, r.examples.len()));
    assert_eq!(network, Some((0.8, 2)));

    // cosine with "my wifi keeps dropping" is about 0.9995
    let intent = h.cascade.detect("internet drops every evening", None, None).await;
    assert_eq!(intent.source, IntentSource::SemanticRouter);
    assert_eq!(intent.recommended_processor, ProcessorKind::StepBack);
}

#[tokio::test]
async fn semantic_no_cascade_route_stops_the_cascade() {
    let h = harness("semantic_routes", IntentConfig::default()).await;
    let (intent, decision) = h
        .cascade
        .detect_with_decision("give me the q3 report summary", None, None)
        .await;

    assert_eq!(intent.task_type, TaskType::Summarization);
    assert_eq!(intent.recommended_processor, ProcessorKind::Hyde);
    assert_eq!(decision.detector_results.len(), 2);
    assert_eq!(h.planner.classify_calls(), 0);
}

#[tokio::test]
async fn semantic_lock_route_is_final() {
    let h = harness("semantic_routes", IntentConfig::default()).await;
    let intent = h.cascade.detect("how much is shipping", None, None).await;
    assert_eq!(intent.attributes["route_key"], "SHIPPING");
    assert!(intent.lock_processor);
    assert_eq!(h.planner.classify_calls(), 0);
}

#[tokio::test]
async fn unmatched_query_falls_back_when_planner_is_disabled() {
    let h = harness("weather_lock", planner_off()).await;
    let (intent, decision) = h
        .cascade
        .detect_with_decision("tell me about penguins", None, None)
        .await;

    assert_eq!(intent.source, IntentSource::Fallback);
    assert_eq!(intent.task_type, TaskType::Unknown);
    assert!(intent.requires_clarification);
    assert_eq!(intent.confidence, IntentConfig::default().fallback_confidence);
    assert_eq!(decision.detector_results.len(), 3);
    assert_eq!(decision.matched_detectors().count(), 0);
    assert_eq!(decision.detector_results[2].reason, "planner disabled");
}

#[tokio::test]
async fn failing_detectors_are_recorded_and_skipped() {
    let h = harness("weather_lock", IntentConfig::default()).await;
    h.embedder.fail_on("tell me about penguins");
    h.planner.set_classify_failing(true);

    let (intent, decision) = h
        .cascade
        .detect_with_decision("tell me about penguins", None, None)
        .await;

    assert_eq!(intent.source, IntentSource::Fallback);
    let semantic = &decision.detector_results[1];
    assert!(!semantic.matched);
    assert!(semantic.reason.starts_with("failed:"), "{}", semantic.reason);
    let planner = &decision.detector_results[2];
    assert!(planner.reason.starts_with("failed:"), "{}", planner.reason);
}

#[tokio::test]
async fn repeated_planner_query_is_served_from_the_plan_cache() {
    let h = harness("weather_lock", IntentConfig::default()).await;
    let query = PLANNED;

    let (first, first_decision) = h.cascade.detect_with_decision(query, None, None).await;
    assert_eq!(first.attributes["planner_model"], "llm");
    assert!(!first_decision.cached);

    let (second, second_decision) = h.cascade.detect_with_decision(query, None, None).await;
    assert_eq!(second.attributes["planner_model"], "cached");
    assert_eq!(second.confidence, IntentConfig::default().cached_plan_confidence);
    assert_eq!(second.task_plan, first.task_plan);
    assert!(second_decision.cached);
    assert_eq!(h.planner.classify_calls(), 1);
}

#[tokio::test]
async fn decisions_are_published_only_when_tracking_is_enabled() {
    let (publisher, mut rx) = ChannelPublisher::new(8);
    let mut publishers = PublisherSet::new();
    publishers.register(Arc::new(publisher));
    let h = harness("weather_lock", IntentConfig::default()).await;
    let cascade = h.cascade.with_publishers(publishers);

    cascade.detect("weather in Oslo", None, Some("s1")).await;
    let published = rx.try_recv().unwrap();
    assert_eq!(published.query_text, "weather in Oslo");
    assert_eq!(published.session_id.as_deref(), Some("s1"));

    let (publisher, mut rx) = ChannelPublisher::new(8);
    let mut publishers = PublisherSet::new();
    publishers.register(Arc::new(publisher));
    let config = IntentConfig {
        tracking_enabled: false,
        ..IntentConfig::default()
    };
    let cascade = harness("weather_lock", config).await.cascade.with_publishers(publishers);
    cascade.detect("weather in Oslo", None, None).await;
    assert!(rx.try_recv().is_err());
}
