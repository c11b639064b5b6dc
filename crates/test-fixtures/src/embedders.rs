use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use relay_core::errors::{EmbeddingError, RelayResult};
use relay_core::traits::IEmbeddingProvider;

use crate::lock;

/// Deterministic bag-of-words embedder: each lowercase token adds weight
/// to a blake3-chosen dimension; the result is L2-normalized.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let mut idx = [0u8; 8];
            idx.copy_from_slice(&bytes[..8]);
            let slot = (u64::from_le_bytes(idx) % self.dims as u64) as usize;
            v[slot] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl IEmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> RelayResult<Vec<f32>> {
        Ok(self.vector(text))
    }

    fn embed_batch(&self, texts: &[String]) -> RelayResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Embedder with an exact text → vector table. Unknown texts fall back to
/// a [`HashEmbedder`]. Counts calls and can be told to fail or stall.
pub struct ScriptedEmbedder {
    table: HashMap<String, Vec<f32>>,
    fallback: HashEmbedder,
    fail_all: AtomicBool,
    fail_batches: AtomicBool,
    failing_texts: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    embed_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            table: HashMap::new(),
            fallback: HashEmbedder::new(dims),
            fail_all: AtomicBool::new(false),
            fail_batches: AtomicBool::new(false),
            failing_texts: Mutex::new(HashSet::new()),
            delay: Mutex::new(None),
            embed_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    /// Map `text` to a fixed vector.
    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    /// Make `embed_batch` fail while single embeds keep working.
    pub fn set_batch_failing(&self, failing: bool) {
        self.fail_batches.store(failing, Ordering::SeqCst);
    }

    pub fn fail_on(&self, text: &str) {
        lock(&self.failing_texts).insert(text.to_string());
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, text: &str) -> RelayResult<Vec<f32>> {
        if self.fail_all.load(Ordering::SeqCst) || lock(&self.failing_texts).contains(text) {
            return Err(EmbeddingError::ProviderFailed {
                provider: "scripted".to_string(),
                reason: format!("scripted failure for {text:?}"),
            }
            .into());
        }
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.vector(text)))
    }

    fn stall(&self) {
        let delay = *lock(&self.delay);
        if let Some(d) = delay {
            std::thread::sleep(d);
        }
    }
}

impl IEmbeddingProvider for ScriptedEmbedder {
    fn embed(&self, text: &str) -> RelayResult<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        self.stall();
        self.lookup(text)
    }

    fn embed_batch(&self, texts: &[String]) -> RelayResult<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.stall();
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(EmbeddingError::ProviderFailed {
                provider: "scripted".to_string(),
                reason: "batch endpoint unavailable".to_string(),
            }
            .into());
        }
        texts.iter().map(|t| self.lookup(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.fallback.dimensions()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
