//! In-memory embedding cache in front of any provider.
//!
//! Keys are blake3 content hashes. Batches may be partially cached: only
//! the misses reach the wrapped provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use crate::config::EmbeddingConfig;
use crate::errors::{EmbeddingError, RelayError, RelayResult};
use crate::traits::IEmbeddingProvider;

pub struct CachingEmbedder {
    inner: Arc<dyn IEmbeddingProvider>,
    cache: Cache<String, Vec<f32>>,
}

impl CachingEmbedder {
    pub fn new(inner: Arc<dyn IEmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_idle(Duration::from_secs(config.cache_idle_secs))
            .time_to_live(Duration::from_secs(config.cache_ttl_secs))
            .build();
        Self { inner, cache }
    }

    fn key(text: &str) -> String {
        blake3::hash(text.as_bytes()).to_hex().to_string()
    }

    /// Cached vector for `text`, without calling the provider.
    pub fn cached(&self, text: &str) -> Option<Vec<f32>> {
        self.cache.get(&Self::key(text))
    }

    /// Invalidate all entries.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl IEmbeddingProvider for CachingEmbedder {
    fn embed(&self, text: &str) -> RelayResult<Vec<f32>> {
        let key = Self::key(text);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let vector = self.inner.embed(text)?;
        self.cache.insert(key, vector.clone());
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> RelayResult<Vec<Vec<f32>>> {
        let keys: Vec<String> = texts.iter().map(|t| Self::key(t)).collect();
        let mut resolved: HashMap<&str, Vec<f32>> = HashMap::new();
        let mut misses: Vec<String> = Vec::new();
        let mut miss_keys: Vec<&str> = Vec::new();

        for (text, key) in texts.iter().zip(&keys) {
            if resolved.contains_key(key.as_str()) || miss_keys.contains(&key.as_str()) {
                continue;
            }
            match self.cache.get(key) {
                Some(hit) => {
                    resolved.insert(key.as_str(), hit);
                }
                None => {
                    misses.push(text.clone());
                    miss_keys.push(key.as_str());
                }
            }
        }

        if !misses.is_empty() {
            let vectors = self.inner.embed_batch(&misses)?;
            if vectors.len() != misses.len() {
                return Err(EmbeddingError::BatchMismatch {
                    sent: misses.len(),
                    received: vectors.len(),
                }
                .into());
            }
            tracing::debug!(
                provider = self.inner.name(),
                requested = texts.len(),
                computed = misses.len(),
                "embedding batch partially cached"
            );
            for (key, vector) in miss_keys.into_iter().zip(vectors) {
                self.cache.insert(key.to_string(), vector.clone());
                resolved.insert(key, vector);
            }
        }

        keys.iter()
            .map(|k| {
                resolved.get(k.as_str()).cloned().ok_or_else(|| {
                    RelayError::from(EmbeddingError::ProviderFailed {
                        provider: self.inner.name().to_string(),
                        reason: "batch result missing an input".to_string(),
                    })
                })
            })
            .collect()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Records every text it is asked to embed.
    struct RecordingProvider {
        seen: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl RecordingProvider {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn vector_for(text: &str) -> Vec<f32> {
            vec![text.len() as f32, 1.0]
        }
    }

    impl IEmbeddingProvider for RecordingProvider {
        fn embed(&self, text: &str) -> RelayResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            Ok(Self::vector_for(text))
        }

        fn embed_batch(&self, texts: &[String]) -> RelayResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().extend(texts.iter().cloned());
            Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn embedder() -> (Arc<RecordingProvider>, CachingEmbedder) {
        let inner = Arc::new(RecordingProvider::new());
        let cache = CachingEmbedder::new(inner.clone(), &EmbeddingConfig::default());
        (inner, cache)
    }

    #[test]
    fn repeated_embed_hits_cache() {
        let (inner, cache) = embedder();
        let a = cache.embed("hello").unwrap();
        let b = cache.embed("hello").unwrap();
        assert_eq!(a, b);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert!(cache.cached("hello").is_some());
    }

    #[test]
    fn batch_only_computes_misses_and_keeps_order() {
        let (inner, cache) = embedder();
        cache.embed("bb").unwrap();
        inner.seen.lock().unwrap().clear();

        let texts = vec!["a".to_string(), "bb".to_string(), "ccc".to_string(), "a".to_string()];
        let out = cache.embed_batch(&texts).unwrap();

        assert_eq!(out.len(), 4);
        assert_eq!(out[0], vec![1.0, 1.0]);
        assert_eq!(out[1], vec![2.0, 1.0]);
        assert_eq!(out[2], vec![3.0, 1.0]);
        assert_eq!(out[3], out[0]);
        assert_eq!(*inner.seen.lock().unwrap(), vec!["a".to_string(), "ccc".to_string()]);
    }

    #[test]
    fn fully_cached_batch_skips_provider() {
        let (inner, cache) = embedder();
        let texts = vec!["x".to_string(), "yy".to_string()];
        cache.embed_batch(&texts).unwrap();
        let calls = inner.calls.load(Ordering::SeqCst);
        cache.embed_batch(&texts).unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), calls);
    }
}
