use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::DocAggregation;

/// Retrieval defaults, overridable per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub min_score: f64,
    pub index_name: String,
    /// Raw hits requested = `top_k * candidate_multiplier`.
    pub candidate_multiplier: usize,
    pub doc_agg: DocAggregation,
    pub neighbor_window: u32,
    pub per_doc_max_chunks: usize,
    pub max_contexts: usize,
    /// Re-query once with a relaxed score floor when nothing survives aggregation.
    pub relax_on_empty: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: defaults::DEFAULT_TOP_K,
            min_score: defaults::DEFAULT_MIN_SCORE,
            index_name: defaults::DEFAULT_INDEX_NAME.to_string(),
            candidate_multiplier: defaults::DEFAULT_CANDIDATE_MULTIPLIER,
            doc_agg: DocAggregation::MeanTop2,
            neighbor_window: defaults::DEFAULT_NEIGHBOR_WINDOW,
            per_doc_max_chunks: defaults::DEFAULT_PER_DOC_MAX_CHUNKS,
            max_contexts: defaults::DEFAULT_MAX_CONTEXTS,
            relax_on_empty: defaults::DEFAULT_RELAX_ON_EMPTY,
        }
    }
}
