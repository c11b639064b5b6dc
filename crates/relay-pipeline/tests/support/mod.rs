//! Shared wiring for the pipeline integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use relay_core::config::RelayConfig;
use relay_core::models::ChunkHit;
use relay_core::traits::{IEvaluator, IGenerator};
use relay_pipeline::{Capabilities, QueryService};
use test_fixtures::{
    chunk, load_rules, CountingPlanner, EchoGenerator, FixedEvaluator, InMemoryQueryRepository,
    InMemoryResponseRepository, ManualClock, ScriptedEmbedder, ScriptedVectorStore,
    StaticRuleRepository,
};

pub struct Harness {
    pub service: QueryService,
    pub embedder: Arc<ScriptedEmbedder>,
    pub store: Arc<ScriptedVectorStore>,
    pub planner: Arc<CountingPlanner>,
    pub queries: Arc<InMemoryQueryRepository>,
    pub responses: Arc<InMemoryResponseRepository>,
    pub rules: Arc<StaticRuleRepository>,
    pub echo: Arc<EchoGenerator>,
}

pub struct HarnessBuilder {
    config: RelayConfig,
    rule_set: &'static str,
    hits: Vec<ChunkHit>,
    embedder: ScriptedEmbedder,
    echo: Arc<EchoGenerator>,
    generator: Arc<dyn IGenerator>,
    evaluator: Arc<dyn IEvaluator>,
}

pub fn builder() -> HarnessBuilder {
    let echo = Arc::new(EchoGenerator::new());
    HarnessBuilder {
        config: RelayConfig::default(),
        rule_set: "weather_lock",
        hits: default_hits(),
        embedder: ScriptedEmbedder::new(4)
            .with("will it rain tomorrow", vec![1.0, 0.0, 0.0, 0.0])
            .with("where is my order", vec![0.0, 1.0, 0.0, 0.0]),
        generator: echo.clone(),
        echo,
        evaluator: Arc::new(FixedEvaluator::new(8.0)),
    }
}

/// Two documents above the default score floor, one below it.
pub fn default_hits() -> Vec<ChunkHit> {
    vec![
        chunk("a", 0, 0.9),
        chunk("a", 1, 0.85),
        chunk("a", 2, 0.8),
        chunk("b", 0, 0.7),
        chunk("c", 3, 0.4),
    ]
}

impl HarnessBuilder {
    pub fn config(mut self, f: impl FnOnce(&mut RelayConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn rules(mut self, rule_set: &'static str) -> Self {
        self.rule_set = rule_set;
        self
    }

    pub fn hits(mut self, hits: Vec<ChunkHit>) -> Self {
        self.hits = hits;
        self
    }

    pub fn embedding(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.embedder = self.embedder.with(text, vector);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn IGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn evaluator(mut self, evaluator: Arc<dyn IEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub async fn build(self) -> Harness {
        let embedder = Arc::new(self.embedder);
        let store = Arc::new(ScriptedVectorStore::new(self.hits));
        let planner = Arc::new(CountingPlanner::three_step());
        let queries = Arc::new(InMemoryQueryRepository::new());
        let responses = Arc::new(InMemoryResponseRepository::new());
        let rules = Arc::new(StaticRuleRepository::new(load_rules(self.rule_set)));

        let service = QueryService::new(
            self.config,
            Capabilities {
                embedder: embedder.clone(),
                vector_store: store.clone(),
                generator: self.generator,
                evaluator: self.evaluator,
                planner: planner.clone(),
                queries: queries.clone(),
                responses: responses.clone(),
                rules: rules.clone(),
                clock: Arc::new(ManualClock::new(1_700_000_000_000)),
            },
        )
        .unwrap();
        service.refresh_routes().await.unwrap();

        Harness {
            service,
            embedder,
            store,
            planner,
            queries,
            responses,
            rules,
            echo: self.echo,
        }
    }
}
