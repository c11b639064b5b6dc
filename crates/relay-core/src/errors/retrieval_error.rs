/// Retrieval subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("search failed: {reason}")]
    SearchFailed { reason: String },

    #[error("neighbor fetch failed for document {document_id}: {reason}")]
    NeighborFetchFailed { document_id: String, reason: String },
}
