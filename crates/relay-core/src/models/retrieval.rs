use serde::{Deserialize, Serialize};

use super::query::QueryParams;
use crate::config::RetrievalConfig;
use crate::errors::{RelayError, RelayResult};

/// How per-chunk scores reduce to one document score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocAggregation {
    /// Mean of the top two kept chunk scores.
    MeanTop2,
    /// Best kept chunk score.
    Max,
}

/// A raw nearest-neighbor row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkHit {
    pub document_id: String,
    pub chunk_index: u32,
    pub content: String,
    pub title: Option<String>,
    pub source: Option<String>,
    pub start_pos: Option<u64>,
    pub end_pos: Option<u64>,
    pub score: f64,
}

/// Fully resolved retrieval parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalParams {
    pub top_k: usize,
    pub min_score: f64,
    pub index_name: Option<String>,
    pub candidate_multiplier: usize,
    pub doc_agg: DocAggregation,
    pub neighbor_window: u32,
    pub per_doc_max_chunks: usize,
    pub max_contexts: usize,
}

impl RetrievalParams {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        let index_name = Some(config.index_name.clone()).filter(|name| !name.trim().is_empty());
        Self {
            top_k: config.top_k,
            min_score: config.min_score,
            index_name,
            candidate_multiplier: config.candidate_multiplier,
            doc_agg: config.doc_agg,
            neighbor_window: config.neighbor_window,
            per_doc_max_chunks: config.per_doc_max_chunks,
            max_contexts: config.max_contexts,
        }
    }

    /// Request overrides falling back field by field to the configured defaults.
    pub fn resolve(overrides: Option<&QueryParams>, config: &RetrievalConfig) -> RelayResult<Self> {
        let mut params = Self::from_config(config);
        if let Some(o) = overrides {
            if let Some(v) = o.top_k {
                params.top_k = positive("top_k", v)?;
            }
            if let Some(v) = o.min_score {
                params.min_score = v;
            }
            if let Some(name) = &o.index_name {
                params.index_name = Some(name.clone()).filter(|n| !n.trim().is_empty());
            }
            if let Some(v) = o.candidate_multiplier {
                params.candidate_multiplier = positive("candidate_multiplier", v)?;
            }
            if let Some(v) = o.doc_agg {
                params.doc_agg = v;
            }
            if let Some(v) = o.neighbor_window {
                params.neighbor_window = u32::try_from(v).map_err(|_| {
                    RelayError::validation("neighbor_window", format!("must be >= 0, got {v}"))
                })?;
            }
            if let Some(v) = o.per_doc_max_chunks {
                params.per_doc_max_chunks = positive("per_doc_max_chunks", v)?;
            }
            if let Some(v) = o.max_contexts {
                params.max_contexts = positive("max_contexts", v)?;
            }
        }
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> RelayResult<()> {
        if self.top_k == 0 {
            return Err(RelayError::validation("top_k", "must be greater than 0"));
        }
        if self.candidate_multiplier == 0 {
            return Err(RelayError::validation(
                "candidate_multiplier",
                "must be greater than 0",
            ));
        }
        if self.per_doc_max_chunks == 0 {
            return Err(RelayError::validation(
                "per_doc_max_chunks",
                "must be greater than 0",
            ));
        }
        if self.max_contexts == 0 {
            return Err(RelayError::validation("max_contexts", "must be greater than 0"));
        }
        if !self.min_score.is_finite() || !(-1.0..=1.0).contains(&self.min_score) {
            return Err(RelayError::validation(
                "min_score",
                format!("must be within [-1, 1], got {}", self.min_score),
            ));
        }
        Ok(())
    }

    /// Raw hits requested from the vector store.
    pub fn candidate_count(&self) -> usize {
        self.top_k.saturating_mul(self.candidate_multiplier)
    }
}

fn positive(field: &str, value: i64) -> RelayResult<usize> {
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| RelayError::validation(field, format!("must be greater than 0, got {value}")))
}

/// Why a chunk is in the evidence set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextOrigin {
    /// Returned by the nearest-neighbor search and kept after capping.
    Retrieved,
    /// Pulled in by neighbor expansion around a retrieved chunk.
    Neighbor { anchor_chunk: u32 },
}

/// One chunk of the final, ordered evidence set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub chunk: ChunkHit,
    pub document_score: f64,
    /// Zero-based rank of the owning document.
    pub rank: usize,
    pub origin: ContextOrigin,
}

impl RetrievedContext {
    pub fn is_neighbor(&self) -> bool {
        matches!(self.origin, ContextOrigin::Neighbor { .. })
    }
}
