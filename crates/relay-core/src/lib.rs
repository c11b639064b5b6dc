//! # relay-core
//!
//! Foundation crate for the Relay query pipeline.
//! Defines the data model, capability traits, errors, config, and defaults.
//! Every other crate in the workspace depends on this.

pub mod blocking;
pub mod config;
pub mod embedding_cache;
pub mod errors;
pub mod models;
pub mod similarity;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::RelayConfig;
pub use errors::{ErrorKind, RelayError, RelayResult};
pub use models::{
    ChunkHit, Complexity, DetectorResult, EvaluationScores, IntentRule, IntentSource,
    ProcessorKind, Query, QueryIntent, QueryStatus, Response, RetrievalParams, RoutingDecision,
    TaskNode, TaskPlan, TaskType, TopicDomain,
};
