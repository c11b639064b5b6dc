use super::{
    CacheError, ConfigError, EmbeddingError, EvaluationError, GenerationError, PlanningError,
    RetrievalError, StorageError, TrackingError,
};

/// Top-level error type for the Relay pipeline.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("planning error: {0}")]
    Planning(#[from] PlanningError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("no processor registered for route {selector}")]
    RouteNotFound { selector: String },

    #[error("plan not found: {reason}")]
    PlanNotFound { reason: String },

    #[error("{capability} call timed out after {timeout_ms}ms")]
    Timeout { capability: String, timeout_ms: u64 },

    #[error("{capability} call panicked")]
    CapabilityPanicked { capability: String },
}

/// Coarse classification of a [`RelayError`], used for logging and for
/// deciding whether a stage failure is recovered in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Embedding,
    Retrieval,
    Generation,
    Evaluation,
    Cache,
    Planning,
    Storage,
    Config,
    Tracking,
    RouteNotFound,
    PlanNotFound,
    Timeout,
    Internal,
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Embedding(_) => ErrorKind::Embedding,
            Self::Retrieval(_) => ErrorKind::Retrieval,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Evaluation(_) => ErrorKind::Evaluation,
            Self::Cache(_) => ErrorKind::Cache,
            Self::Planning(_) => ErrorKind::Planning,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
            Self::Tracking(_) => ErrorKind::Tracking,
            Self::RouteNotFound { .. } => ErrorKind::RouteNotFound,
            Self::PlanNotFound { .. } => ErrorKind::PlanNotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::CapabilityPanicked { .. } => ErrorKind::Internal,
        }
    }

    /// Only evaluation and cache failures are recovered where they happen.
    /// Everything else aborts the current query.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Evaluation | ErrorKind::Cache)
    }

    /// Shorthand for a [`RelayError::Validation`].
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias.
pub type RelayResult<T> = Result<T, RelayError>;
