use crate::errors::RelayResult;
use crate::models::EvaluationScores;

/// Answer quality evaluation.
pub trait IEvaluator: Send + Sync {
    fn evaluate(&self, query: &str, answer: &str, context: &str) -> RelayResult<EvaluationScores>;
}
