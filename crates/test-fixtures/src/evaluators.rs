use std::sync::atomic::{AtomicUsize, Ordering};

use relay_core::errors::{EvaluationError, RelayResult};
use relay_core::models::EvaluationScores;
use relay_core::traits::IEvaluator;

/// Uniform scores with no error.
pub fn scores(value: f64) -> EvaluationScores {
    EvaluationScores {
        faithfulness: value,
        relevance: value,
        context_relevance: value,
        factual_consistency: value,
        completeness: value,
        conciseness: value,
        total_score: value,
        reasoning: Some("scripted".to_string()),
        error: None,
    }
}

/// Returns the same scores every time.
pub struct FixedEvaluator {
    scores: EvaluationScores,
    calls: AtomicUsize,
}

impl FixedEvaluator {
    pub fn new(value: f64) -> Self {
        Self {
            scores: scores(value),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IEvaluator for FixedEvaluator {
    fn evaluate(&self, _: &str, _: &str, _: &str) -> RelayResult<EvaluationScores> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

/// Always fails.
#[derive(Default)]
pub struct FailingEvaluator {
    calls: AtomicUsize,
}

impl FailingEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IEvaluator for FailingEvaluator {
    fn evaluate(&self, _: &str, _: &str, _: &str) -> RelayResult<EvaluationScores> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(EvaluationError::EvaluationFailed {
            reason: "judge model timed out".to_string(),
        }
        .into())
    }
}

/// Fails the first `failures` calls, then returns fixed scores.
pub struct FlakyEvaluator {
    failures: usize,
    scores: EvaluationScores,
    calls: AtomicUsize,
}

impl FlakyEvaluator {
    pub fn new(failures: usize, value: f64) -> Self {
        Self {
            failures,
            scores: scores(value),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IEvaluator for FlakyEvaluator {
    fn evaluate(&self, _: &str, _: &str, _: &str) -> RelayResult<EvaluationScores> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(EvaluationError::EvaluationFailed {
                reason: format!("flaky failure {}", n + 1),
            }
            .into());
        }
        Ok(self.scores.clone())
    }
}

/// Returns scripted totals in order, repeating the last one.
pub struct SequenceEvaluator {
    values: Vec<f64>,
    calls: AtomicUsize,
}

impl SequenceEvaluator {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IEvaluator for SequenceEvaluator {
    fn evaluate(&self, _: &str, _: &str, _: &str) -> RelayResult<EvaluationScores> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let value = self
            .values
            .get(n)
            .or_else(|| self.values.last())
            .copied()
            .ok_or_else(|| EvaluationError::EvaluationFailed {
                reason: "no scripted scores".to_string(),
            })?;
        Ok(scores(value))
    }
}
