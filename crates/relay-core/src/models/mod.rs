//! Data model shared across the pipeline.

pub mod evaluation;
pub mod intent;
pub mod plan;
pub mod query;
pub mod response;
pub mod retrieval;
pub mod routing;
pub mod rule;

pub use evaluation::EvaluationScores;
pub use intent::{Complexity, IntentSource, ProcessorKind, QueryIntent, TaskType, TopicDomain};
pub use plan::{PlannerClassification, TaskNode, TaskPlan, AUTO_TOOL};
pub use query::{Query, QueryParams, QueryRequest, QueryStatus};
pub use response::{Response, SourceRef, SourceSpan};
pub use retrieval::{ChunkHit, ContextOrigin, DocAggregation, RetrievalParams, RetrievedContext};
pub use routing::{DetectorResult, RoutingDecision};
pub use rule::{IntentRule, MatchMode, RuleType};
