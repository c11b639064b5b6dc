//! Structured log events for key pipeline operations.
//!
//! Each function emits a `tracing` event with structured fields.

/// Log a plan cache hit.
pub fn plan_cache_hit(similarity: f64, bucket: &str) {
    tracing::debug!(
        event = "plan_cache_hit",
        similarity = similarity,
        bucket = %bucket,
        "plan cache hit"
    );
}

/// Log a route index refresh.
pub fn routes_refreshed(lexical_rules: usize, semantic_routes: usize, examples: usize) {
    tracing::info!(
        event = "routes_refreshed",
        lexical_rules = lexical_rules,
        semantic_routes = semantic_routes,
        examples = examples,
        "intent routes refreshed"
    );
}

/// Log a query reaching COMPLETED.
pub fn query_completed(query_id: &str, processor: &str, contexts: usize, latency_ms: u64) {
    tracing::info!(
        event = "query_completed",
        query_id = %query_id,
        processor = %processor,
        contexts = contexts,
        latency_ms = latency_ms,
        "query completed"
    );
}

/// Log a query reaching FAILED.
pub fn query_failed(query_id: &str, stage: &str, error: &str) {
    tracing::warn!(
        event = "query_failed",
        query_id = %query_id,
        stage = %stage,
        error = %error,
        "query failed"
    );
}

/// Log a stage recovering from a failure with a fallback.
pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component = %component,
        failure = %failure,
        fallback = %fallback,
        "degradation triggered"
    );
}
