use std::sync::Arc;

use relay_core::config::{IntentConfig, PlanningConfig, TimeoutConfig};
use relay_core::errors::ErrorKind;
use relay_core::models::{IntentSource, TaskType};
use relay_core::traits::IClock;
use relay_intent::IntentCascade;
use relay_planning::{TaskPlanCache, TaskPlanner};
use test_fixtures::{load_rules, CountingPlanner, ManualClock, ScriptedEmbedder, StaticRuleRepository};

fn cascade_with(embedder: Arc<ScriptedEmbedder>, clock: Arc<ManualClock>) -> IntentCascade {
    let planner = Arc::new(CountingPlanner::three_step());
    let cache = Arc::new(TaskPlanCache::new(
        PlanningConfig::default(),
        Arc::clone(&clock) as Arc<dyn IClock>,
    ));
    let task_planner = Arc::new(TaskPlanner::new(
        Arc::clone(&embedder) as _,
        Arc::clone(&planner) as _,
        cache,
        TimeoutConfig::default(),
    ));
    IntentCascade::new(
        IntentConfig {
            planner_enabled: false,
            ..IntentConfig::default()
        },
        TimeoutConfig::default(),
        embedder,
        planner,
        task_planner,
        clock,
    )
}

fn scripted() -> Arc<ScriptedEmbedder> {
    Arc::new(
        ScriptedEmbedder::new(4)
            .with("will it rain tomorrow", vec![1.0, 0.0, 0.0, 0.0])
            .with("where is my order", vec![0.0, 1.0, 0.0, 0.0])
            .with("help", vec![0.0, 0.0, 1.0, 0.0]),
    )
}

#[tokio::test]
async fn refresh_reports_index_size_and_stamps_build_time() {
    let clock = Arc::new(ManualClock::new(42_000));
    let cascade = cascade_with(scripted(), Arc::clone(&clock));
    assert_eq!(cascade.snapshot().stats().lexical_rules, 0);

    let repo = Arc::new(StaticRuleRepository::new(load_rules("weather_lock")));
    let stats = cascade.refresh(repo.clone()).await.unwrap();

    assert_eq!(stats.lexical_rules, 1);
    assert_eq!(stats.semantic_routes, 2);
    assert_eq!(stats.examples, 2);
    assert_eq!(cascade.snapshot().built_at_ms, 42_000);
    // one fetch for lexical rules, one for semantic examples
    assert_eq!(repo.calls(), 2);
}

#[tokio::test]
async fn failed_refresh_keeps_the_previous_index() {
    let cascade = cascade_with(scripted(), Arc::new(ManualClock::new(0)));
    let repo = Arc::new(StaticRuleRepository::new(load_rules("weather_lock")));
    let before = cascade.refresh(repo.clone()).await.unwrap();

    repo.set_failing(true);
    let err = cascade.refresh(repo.clone()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(cascade.snapshot().stats(), before);

    let intent = cascade.detect("weather for the weekend", None, None).await;
    assert_eq!(intent.task_type, TaskType::Weather);
}

#[tokio::test]
async fn refresh_picks_up_replaced_rules() {
    let cascade = cascade_with(scripted(), Arc::new(ManualClock::new(0)));
    let repo = Arc::new(StaticRuleRepository::new(load_rules("weather_lock")));
    cascade.refresh(repo.clone()).await.unwrap();
    assert_eq!(cascade.detect("help", None, None).await.source, IntentSource::Fallback);

    repo.replace(load_rules("cascade_mix"));
    cascade.refresh(repo).await.unwrap();

    let intent = cascade.detect("help", None, None).await;
    assert_eq!(intent.task_type, TaskType::Chat);
    let intent = cascade.detect("weather for the weekend", None, None).await;
    assert_eq!(intent.source, IntentSource::Fallback);
}

#[tokio::test]
async fn batch_failure_falls_back_to_single_embeds() {
    let embedder = scripted();
    embedder.set_batch_failing(true);
    let cascade = cascade_with(Arc::clone(&embedder), Arc::new(ManualClock::new(0)));
    let repo = Arc::new(StaticRuleRepository::new(load_rules("weather_lock")));

    let stats = cascade.refresh(repo).await.unwrap();
    assert_eq!(stats.semantic_routes, 2);
    assert_eq!(embedder.batch_calls(), 1);
    assert_eq!(embedder.embed_calls(), 2);
}

#[tokio::test]
async fn route_without_usable_examples_is_dropped() {
    let embedder = scripted();
    embedder.set_batch_failing(true);
    embedder.fail_on("will it rain tomorrow");
    let cascade = cascade_with(Arc::clone(&embedder), Arc::new(ManualClock::new(0)));
    let repo = Arc::new(StaticRuleRepository::new(load_rules("weather_lock")));

    let stats = cascade.refresh(repo).await.unwrap();
    assert_eq!(stats.semantic_routes, 1);
    let keys: Vec<String> = cascade
        .snapshot()
        .semantic
        .routes()
        .iter()
        .map(|r| r.key.clone())
        .collect();
    assert_eq!(keys, vec!["ORDER_STATUS".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn detections_run_against_a_consistent_snapshot_during_refresh() {
    let cascade = Arc::new(cascade_with(scripted(), Arc::new(ManualClock::new(0))));
    let weather = Arc::new(StaticRuleRepository::new(load_rules("weather_lock")));
    let mix = Arc::new(StaticRuleRepository::new(load_rules("cascade_mix")));
    cascade.refresh(weather.clone()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let cascade = Arc::clone(&cascade);
        let repo = if i % 2 == 0 { weather.clone() } else { mix.clone() };
        handles.push(tokio::spawn(async move {
            cascade.refresh(repo).await.unwrap();
        }));
    }
    for _ in 0..32 {
        let cascade = Arc::clone(&cascade);
        handles.push(tokio::spawn(async move {
            let intent = cascade.detect("weather help", None, None).await;
            // Either rule set is acceptable, a mix of the two is not.
            assert!(
                intent.task_type == TaskType::Weather || intent.source == IntentSource::Fallback,
                "unexpected intent {:?}",
                intent.task_type
            );
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = cascade.snapshot().stats();
    assert!(stats.lexical_rules == 1 || stats.lexical_rules == 4);
}
