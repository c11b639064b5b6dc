/// Answer generation errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation failed: {reason}")]
    GenerationFailed { reason: String },

    #[error("generator returned an empty answer")]
    EmptyAnswer,
}
