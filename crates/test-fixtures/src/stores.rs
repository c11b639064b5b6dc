use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use relay_core::errors::{RelayResult, RetrievalError};
use relay_core::models::ChunkHit;
use relay_core::traits::IVectorStore;

use crate::lock;

/// Build a chunk with positional metadata derived from its index.
pub fn chunk(document_id: &str, chunk_index: u32, score: f64) -> ChunkHit {
    let start = u64::from(chunk_index) * 100;
    ChunkHit {
        document_id: document_id.to_string(),
        chunk_index,
        content: format!("{document_id} chunk {chunk_index}"),
        title: Some(format!("Document {document_id}")),
        source: Some(format!("kb://{document_id}")),
        start_pos: Some(start),
        end_pos: Some(start + 99),
        score,
    }
}

/// One recorded `nearest_neighbors` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
    pub top_k: usize,
    pub min_score: f64,
    pub index_name: Option<String>,
}

/// Vector store returning a fixed hit list (filtered and truncated per
/// call) plus a chunk table for neighbor fetches.
#[derive(Default)]
pub struct ScriptedVectorStore {
    hits: Vec<ChunkHit>,
    chunks: HashMap<(String, u32), ChunkHit>,
    fail_search: AtomicBool,
    fail_fetch: AtomicBool,
    searches: Mutex<Vec<SearchCall>>,
    fetches: Mutex<Vec<(String, Vec<u32>)>>,
}

impl ScriptedVectorStore {
    pub fn new(hits: Vec<ChunkHit>) -> Self {
        let mut store = Self {
            hits,
            ..Self::default()
        };
        let known: Vec<ChunkHit> = store.hits.clone();
        for hit in known {
            store
                .chunks
                .insert((hit.document_id.clone(), hit.chunk_index), hit);
        }
        store
    }

    /// Register chunks that are only reachable through `fetch_chunks`.
    pub fn with_chunks(mut self, chunks: Vec<ChunkHit>) -> Self {
        for c in chunks {
            self.chunks.insert((c.document_id.clone(), c.chunk_index), c);
        }
        self
    }

    pub fn set_search_failing(&self, failing: bool) {
        self.fail_search.store(failing, Ordering::SeqCst);
    }

    pub fn set_fetch_failing(&self, failing: bool) {
        self.fail_fetch.store(failing, Ordering::SeqCst);
    }

    pub fn searches(&self) -> Vec<SearchCall> {
        lock(&self.searches).clone()
    }

    pub fn fetches(&self) -> Vec<(String, Vec<u32>)> {
        lock(&self.fetches).clone()
    }
}

impl IVectorStore for ScriptedVectorStore {
    fn nearest_neighbors(
        &self,
        _vector: &[f32],
        top_k: usize,
        min_score: f64,
        index_name: Option<&str>,
    ) -> RelayResult<Vec<ChunkHit>> {
        lock(&self.searches).push(SearchCall {
            top_k,
            min_score,
            index_name: index_name.map(str::to_string),
        });
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(RetrievalError::SearchFailed {
                reason: "scripted search failure".to_string(),
            }
            .into());
        }
        let mut out: Vec<ChunkHit> = self
            .hits
            .iter()
            .filter(|h| h.score >= min_score)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.score.total_cmp(&a.score));
        out.truncate(top_k);
        Ok(out)
    }

    fn fetch_chunks(&self, document_id: &str, chunk_indices: &[u32]) -> RelayResult<Vec<ChunkHit>> {
        lock(&self.fetches).push((document_id.to_string(), chunk_indices.to_vec()));
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(RetrievalError::NeighborFetchFailed {
                document_id: document_id.to_string(),
                reason: "scripted fetch failure".to_string(),
            }
            .into());
        }
        Ok(chunk_indices
            .iter()
            .filter_map(|i| self.chunks.get(&(document_id.to_string(), *i)).cloned())
            .collect())
    }
}
