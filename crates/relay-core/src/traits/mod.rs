//! Capability traits for the external collaborators the pipeline consumes.
//! All are synchronous; async callers bound them with [`crate::blocking::call_blocking`].

pub mod clock;
pub mod embedding;
pub mod evaluator;
pub mod generator;
pub mod planner;
pub mod repository;
pub mod vector_store;

pub use clock::{IClock, SystemClock};
pub use embedding::IEmbeddingProvider;
pub use evaluator::IEvaluator;
pub use generator::{GenerationParams, IGenerator};
pub use planner::ILanguageModelPlanner;
pub use repository::{IIntentRuleRepository, IQueryRepository, IResponseRepository};
pub use vector_store::IVectorStore;
