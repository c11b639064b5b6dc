//! RetrievalEngine: drives embedding, nearest-neighbor search and neighbor
//! fetches around the pure aggregation steps.
//!
//! Search → select (filter, group, cap, score, rank) → fetch neighbors →
//! assemble. Every external call runs on the blocking pool under its
//! configured timeout.

use std::collections::HashMap;
use std::sync::Arc;

use relay_core::blocking::call_blocking;
use relay_core::config::TimeoutConfig;
use relay_core::errors::RelayResult;
use relay_core::models::{ChunkHit, RetrievalParams, RetrievedContext};
use relay_core::traits::{IEmbeddingProvider, IVectorStore};
use relay_observability::retrieval_span;
use tracing::{debug, info, warn, Instrument};

use crate::aggregation::{assemble, select, Selection};
use crate::expansion::missing_neighbors;

/// Result of one retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOutcome {
    /// The query embedding used for the search.
    pub vector: Vec<f32>,
    pub contexts: Vec<RetrievedContext>,
    pub raw_hits: usize,
    /// The empty-result relaxation ran.
    pub relaxed: bool,
}

pub struct RetrievalEngine {
    store: Arc<dyn IVectorStore>,
    embedder: Arc<dyn IEmbeddingProvider>,
    timeouts: TimeoutConfig,
    relax_on_empty: bool,
}

impl RetrievalEngine {
    pub fn new(
        store: Arc<dyn IVectorStore>,
        embedder: Arc<dyn IEmbeddingProvider>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            timeouts,
            relax_on_empty: false,
        }
    }

    /// Re-query once with a relaxed score floor when nothing survives.
    pub fn with_relax_on_empty(mut self, enabled: bool) -> Self {
        self.relax_on_empty = enabled;
        self
    }

    /// Embed `text` under the embedding timeout.
    pub async fn embed(&self, text: &str) -> RelayResult<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        let text = text.to_string();
        call_blocking("embedding", self.timeouts.embedding(), move || {
            embedder.embed(&text)
        })
        .await
    }

    /// Retrieve ordered contexts for a query, reusing `vector` when given.
    pub async fn retrieve(
        &self,
        query_text: &str,
        vector: Option<Vec<f32>>,
        params: &RetrievalParams,
    ) -> RelayResult<RetrievalOutcome> {
        let span = retrieval_span!(params.top_k, params.max_contexts);
        self.retrieve_inner(query_text, vector, params)
            .instrument(span)
            .await
    }

    async fn retrieve_inner(
        &self,
        query_text: &str,
        vector: Option<Vec<f32>>,
        params: &RetrievalParams,
    ) -> RelayResult<RetrievalOutcome> {
        params.validate()?;
        let vector = match vector {
            Some(v) if !v.is_empty() => v,
            _ => self.embed(query_text).await?,
        };

        let (contexts, raw_hits) = self.run(&vector, params).await?;
        if !contexts.is_empty() || !self.relax_on_empty {
            return Ok(RetrievalOutcome {
                vector,
                contexts,
                raw_hits,
                relaxed: false,
            });
        }

        let relaxed = RetrievalParams {
            min_score: params.min_score.min(0.0),
            candidate_multiplier: params.candidate_multiplier.saturating_mul(2),
            ..params.clone()
        };
        info!(
            min_score = relaxed.min_score,
            candidates = relaxed.candidate_count(),
            "no contexts survived aggregation, retrying with relaxed parameters"
        );
        let (contexts, raw_hits) = self.run(&vector, &relaxed).await?;
        Ok(RetrievalOutcome {
            vector,
            contexts,
            raw_hits,
            relaxed: true,
        })
    }

    async fn run(
        &self,
        vector: &[f32],
        params: &RetrievalParams,
    ) -> RelayResult<(Vec<RetrievedContext>, usize)> {
        let raw = self.search(vector, params).await?;
        let selection = select(raw, params);
        debug!(
            raw_hits = selection.raw_hits,
            accepted = selection.accepted_hits,
            documents = selection.documents.len(),
            "hits grouped by document"
        );

        let neighbors = self.fetch_neighbors(&selection, params).await;
        let contexts = assemble(&selection.documents, &neighbors, params);
        info!(
            contexts = contexts.len(),
            documents = selection.documents.len(),
            max_contexts = params.max_contexts,
            "retrieval complete"
        );
        Ok((contexts, selection.raw_hits))
    }

    async fn search(&self, vector: &[f32], params: &RetrievalParams) -> RelayResult<Vec<ChunkHit>> {
        let store = Arc::clone(&self.store);
        let vector = vector.to_vec();
        let top_k = params.candidate_count();
        let min_score = params.min_score;
        let index_name = params.index_name.clone();
        call_blocking("vector_search", self.timeouts.vector_search(), move || {
            store.nearest_neighbors(&vector, top_k, min_score, index_name.as_deref())
        })
        .await
    }

    /// Fetch missing neighbors for the documents that can still reach the
    /// output. A failed fetch skips expansion for that document only.
    async fn fetch_neighbors(
        &self,
        selection: &Selection,
        params: &RetrievalParams,
    ) -> HashMap<String, Vec<ChunkHit>> {
        let mut neighbors = HashMap::new();
        if params.neighbor_window == 0 {
            return neighbors;
        }

        let mut anchors_before = 0usize;
        for doc in &selection.documents {
            if anchors_before >= params.max_contexts {
                break;
            }
            anchors_before += doc.kept.len();

            let wanted = missing_neighbors(doc, params.neighbor_window);
            if wanted.is_empty() {
                continue;
            }
            let store = Arc::clone(&self.store);
            let document_id = doc.document_id.clone();
            let indices = wanted.clone();
            let fetched = call_blocking("vector_search", self.timeouts.vector_search(), move || {
                store.fetch_chunks(&document_id, &indices)
            })
            .await;
            match fetched {
                Ok(chunks) => {
                    let chunks: Vec<ChunkHit> = chunks
                        .into_iter()
                        .filter(|c| c.document_id == doc.document_id)
                        .filter(|c| wanted.binary_search(&c.chunk_index).is_ok())
                        .collect();
                    neighbors.insert(doc.document_id.clone(), chunks);
                }
                Err(e) => warn!(
                    document_id = %doc.document_id,
                    error = %e,
                    "neighbor fetch failed, skipping expansion"
                ),
            }
        }
        neighbors
    }
}
