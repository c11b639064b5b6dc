//! Semantic route table: example embeddings grouped by route key, scored
//! against the query embedding by cosine similarity.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use relay_core::blocking::call_blocking;
use relay_core::config::TimeoutConfig;
use relay_core::models::{IntentRule, RuleType};
use relay_core::similarity::max_similarity;
use relay_core::traits::IEmbeddingProvider;
use tracing::{debug, warn};

/// One route: every active example sharing a route key.
#[derive(Debug, Clone)]
pub struct SemanticRoute {
    pub key: String,
    /// First explicit threshold in priority order, else the global default.
    pub threshold: f64,
    /// Highest-priority rule of the route. Supplies target, task type,
    /// domain and lock/cascade flags.
    pub template: IntentRule,
    pub examples: Vec<Vec<f32>>,
}

impl SemanticRoute {
    pub fn best_similarity(&self, vector: &[f32]) -> Option<f64> {
        max_similarity(vector, &self.examples)
    }
}

/// The route that best matched a query.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a SemanticRoute,
    pub similarity: f64,
}

/// Routes in priority order of their template rule.
#[derive(Debug, Clone, Default)]
pub struct SemanticRouteTable {
    routes: Vec<SemanticRoute>,
}

struct PendingRoute {
    key: String,
    rules: Vec<IntentRule>,
}

impl SemanticRouteTable {
    /// Group active SEMANTIC_EXAMPLE rules by route key and embed their
    /// examples in one batch. When the batch fails, examples are embedded
    /// one at a time and failures skip the example. Routes left without
    /// any example are dropped.
    pub async fn build(
        mut rules: Vec<IntentRule>,
        embedder: Arc<dyn IEmbeddingProvider>,
        timeouts: &TimeoutConfig,
        global_threshold: f64,
    ) -> Self {
        rules.retain(|r| {
            r.is_active && r.rule_type == RuleType::SemanticExample && !r.content.trim().is_empty()
        });
        rules.sort_by(IntentRule::precedence);

        let mut pending: Vec<PendingRoute> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for rule in rules {
            let key = rule.route_key();
            let pos = *positions.entry(key.clone()).or_insert_with(|| {
                pending.push(PendingRoute {
                    key,
                    rules: Vec::new(),
                });
                pending.len() - 1
            });
            pending[pos].rules.push(rule);
        }

        let texts: Vec<String> = pending
            .iter()
            .flat_map(|p| p.rules.iter().map(|r| r.content.trim().to_string()))
            .collect();
        let vectors = embed_examples(&texts, embedder, timeouts).await;

        let mut vectors = vectors.into_iter();
        let mut routes = Vec::with_capacity(pending.len());
        for p in pending {
            let examples: Vec<Vec<f32>> = p
                .rules
                .iter()
                .filter_map(|_| vectors.next().flatten())
                .collect();
            let threshold = p
                .rules
                .iter()
                .find_map(|r| r.semantic_threshold)
                .unwrap_or(global_threshold);
            let Some(template) = p.rules.into_iter().next() else {
                continue;
            };
            if examples.is_empty() {
                warn!(route = %p.key, "semantic route has no usable examples, dropped");
                continue;
            }
            routes.push(SemanticRoute {
                key: p.key,
                threshold,
                template,
                examples,
            });
        }
        Self { routes }
    }

    pub fn routes(&self) -> &[SemanticRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn example_count(&self) -> usize {
        self.routes.iter().map(|r| r.examples.len()).sum()
    }

    /// Highest-similarity route at or above its own threshold. Ties go to
    /// the higher-priority route.
    pub fn best_match(&self, vector: &[f32]) -> Option<RouteMatch<'_>> {
        self.routes
            .par_iter()
            .enumerate()
            .filter_map(|(i, route)| {
                route
                    .best_similarity(vector)
                    .filter(|s| *s >= route.threshold)
                    .map(|s| (i, s))
            })
            .reduce_with(|a, b| {
                if b.1 > a.1 || (b.1 == a.1 && b.0 < a.0) {
                    b
                } else {
                    a
                }
            })
            .map(|(i, similarity)| RouteMatch {
                route: &self.routes[i],
                similarity,
            })
    }
}

/// One slot per text; `None` where the example could not be embedded.
async fn embed_examples(
    texts: &[String],
    embedder: Arc<dyn IEmbeddingProvider>,
    timeouts: &TimeoutConfig,
) -> Vec<Option<Vec<f32>>> {
    if texts.is_empty() {
        return Vec::new();
    }
    let batch = {
        let embedder = Arc::clone(&embedder);
        let texts = texts.to_vec();
        call_blocking("embedding", timeouts.embedding(), move || {
            embedder.embed_batch(&texts)
        })
        .await
    };
    match batch {
        Ok(vectors) if vectors.len() == texts.len() => {
            debug!(examples = texts.len(), "semantic examples embedded in one batch");
            return vectors.into_iter().map(Some).collect();
        }
        Ok(vectors) => warn!(
            sent = texts.len(),
            received = vectors.len(),
            "example batch size mismatch, embedding one at a time"
        ),
        Err(e) => warn!(error = %e, "example batch failed, embedding one at a time"),
    }

    let mut out = Vec::with_capacity(texts.len());
    for text in texts {
        let embedder = Arc::clone(&embedder);
        let owned = text.clone();
        let result = call_blocking("embedding", timeouts.embedding(), move || {
            embedder.embed(&owned)
        })
        .await;
        match result {
            Ok(v) => out.push(Some(v)),
            Err(e) => {
                warn!(example = %text, error = %e, "semantic example skipped");
                out.push(None);
            }
        }
    }
    out
}
