use crate::errors::RelayResult;

/// Embedding generation provider.
pub trait IEmbeddingProvider: Send + Sync {
    /// Embed a single text, returning a vector of floats.
    fn embed(&self, text: &str) -> RelayResult<Vec<f32>>;

    /// Embed a batch of texts. The output is in input order.
    fn embed_batch(&self, texts: &[String]) -> RelayResult<Vec<Vec<f32>>>;

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}
