//! Error handling for Relay.
//! One error enum per subsystem, `thiserror` only, aggregated by [`RelayError`].

pub mod cache_error;
pub mod config_error;
pub mod embedding_error;
pub mod evaluation_error;
pub mod generation_error;
pub mod planning_error;
pub mod relay_error;
pub mod retrieval_error;
pub mod storage_error;
pub mod tracking_error;

pub use cache_error::CacheError;
pub use config_error::ConfigError;
pub use embedding_error::EmbeddingError;
pub use evaluation_error::EvaluationError;
pub use generation_error::GenerationError;
pub use planning_error::PlanningError;
pub use relay_error::{ErrorKind, RelayError, RelayResult};
pub use retrieval_error::RetrievalError;
pub use storage_error::StorageError;
pub use tracking_error::TrackingError;
