use async_trait::async_trait;
use relay_core::errors::RelayResult;
use relay_core::models::{ProcessorKind, RetrievedContext};

use super::IQueryProcessor;
use crate::execution::QueryExecution;
use crate::stages::PipelineStages;

/// Single retrieval for the query text.
#[derive(Debug, Default)]
pub struct BasicProcessor;

#[async_trait]
impl IQueryProcessor for BasicProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::Basic
    }

    async fn gather(
        &self,
        stages: &PipelineStages,
        exec: &mut QueryExecution,
    ) -> RelayResult<Vec<RetrievedContext>> {
        let vector = stages.embed(exec).await?;
        let text = exec.query.text.clone();
        let outcome = stages.retrieve(exec, &text, Some(vector)).await?;
        Ok(outcome.contexts)
    }

    fn always_evaluates(&self) -> bool {
        true
    }
}
