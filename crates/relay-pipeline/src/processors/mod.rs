//! Query processors. Each one gathers the evidence set its own way; the
//! stages around evidence gathering are shared through [`PipelineStages`].

pub mod basic;
pub mod planned;

use async_trait::async_trait;
use relay_core::errors::RelayResult;
use relay_core::models::{ProcessorKind, RetrievedContext};

use crate::execution::QueryExecution;
use crate::stages::PipelineStages;

pub use basic::BasicProcessor;
pub use planned::PlannedProcessor;

#[async_trait]
pub trait IQueryProcessor: Send + Sync {
    /// Route selector this processor is registered under.
    fn kind(&self) -> ProcessorKind;

    /// Produce the ordered evidence set for the query.
    async fn gather(
        &self,
        stages: &PipelineStages,
        exec: &mut QueryExecution,
    ) -> RelayResult<Vec<RetrievedContext>>;

    /// Evaluate even when the strategy disables evaluation.
    fn always_evaluates(&self) -> bool {
        false
    }
}
