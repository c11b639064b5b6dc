use crate::errors::RelayResult;
use crate::models::ChunkHit;

/// Nearest-neighbor search over indexed evidence chunks.
pub trait IVectorStore: Send + Sync {
    /// Up to `top_k` hits with score >= `min_score`, best first.
    fn nearest_neighbors(
        &self,
        vector: &[f32],
        top_k: usize,
        min_score: f64,
        index_name: Option<&str>,
    ) -> RelayResult<Vec<ChunkHit>>;

    /// Load specific chunks of one document by index, for neighbor expansion.
    /// Missing indices are simply absent from the result.
    fn fetch_chunks(&self, document_id: &str, chunk_indices: &[u32]) -> RelayResult<Vec<ChunkHit>>;
}
