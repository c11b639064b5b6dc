/// Plan cache errors. Never surfaced to callers: every cache failure
/// degrades to a miss.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache key embedding failed: {reason}")]
    KeyEmbeddingFailed { reason: String },

    #[error("cached entry could not be decoded: {reason}")]
    Corrupted { reason: String },
}
