/// Answer evaluation errors. Recovered in place with neutral scores.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("evaluation failed: {reason}")]
    EvaluationFailed { reason: String },

    #[error("evaluator returned malformed scores: {reason}")]
    MalformedScores { reason: String },
}
