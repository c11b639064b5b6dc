//! Span definitions per pipeline stage: intent, planning, retrieval, pipeline.
//!
//! Each span carries its identifying fields via the `tracing` crate.

/// Create an intent detection span.
#[macro_export]
macro_rules! intent_span {
    ($query:expr) => {
        tracing::info_span!("relay.intent", query_chars = $query.chars().count())
    };
}

/// Create a planning span.
#[macro_export]
macro_rules! planning_span {
    ($task_type:expr) => {
        tracing::info_span!("relay.planning", task_type = ?$task_type)
    };
}

/// Create a retrieval span.
#[macro_export]
macro_rules! retrieval_span {
    ($top_k:expr, $max_contexts:expr) => {
        tracing::info_span!("relay.retrieval", top_k = $top_k, max_contexts = $max_contexts)
    };
}

/// Create a query pipeline span.
#[macro_export]
macro_rules! pipeline_span {
    ($query_id:expr, $processor:expr) => {
        tracing::info_span!("relay.pipeline", query_id = %$query_id, processor = %$processor)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const INTENT: &str = "relay.intent";
    pub const PLANNING: &str = "relay.planning";
    pub const RETRIEVAL: &str = "relay.retrieval";
    pub const PIPELINE: &str = "relay.pipeline";
}
