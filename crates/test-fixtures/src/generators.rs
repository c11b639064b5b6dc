use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use relay_core::errors::{GenerationError, RelayResult};
use relay_core::traits::{GenerationParams, IGenerator};

use crate::lock;

/// One recorded `generate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateCall {
    pub query: String,
    pub contexts: Vec<String>,
    pub params: GenerationParams,
}

/// Answers with a deterministic sentence naming the query and context count.
#[derive(Default)]
pub struct EchoGenerator {
    calls: Mutex<Vec<GenerateCall>>,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        lock(&self.calls).clone()
    }
}

impl IGenerator for EchoGenerator {
    fn generate(
        &self,
        query: &str,
        contexts: &[String],
        params: &GenerationParams,
    ) -> RelayResult<String> {
        lock(&self.calls).push(GenerateCall {
            query: query.to_string(),
            contexts: contexts.to_vec(),
            params: params.clone(),
        });
        Ok(format!("answer to '{query}' from {} contexts", contexts.len()))
    }
}

/// Always fails.
#[derive(Default)]
pub struct FailingGenerator {
    calls: AtomicUsize,
}

impl FailingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IGenerator for FailingGenerator {
    fn generate(&self, _: &str, _: &[String], _: &GenerationParams) -> RelayResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::GenerationFailed {
            reason: "model backend unavailable".to_string(),
        }
        .into())
    }
}

/// Sleeps before answering, for timeout tests.
pub struct SlowGenerator {
    delay: Duration,
}

impl SlowGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl IGenerator for SlowGenerator {
    fn generate(&self, query: &str, _: &[String], _: &GenerationParams) -> RelayResult<String> {
        std::thread::sleep(self.delay);
        Ok(format!("late answer to '{query}'"))
    }
}
