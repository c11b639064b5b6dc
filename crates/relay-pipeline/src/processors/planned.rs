use std::collections::HashMap;

use async_trait::async_trait;
use relay_core::errors::{RelayError, RelayResult};
use relay_core::models::{ProcessorKind, RetrievedContext, TaskPlan};
use relay_planning::{execution_waves, TaskExecutionContext};
use tracing::{debug, info};

use super::IQueryProcessor;
use crate::execution::{QueryExecution, Stage};
use crate::stages::PipelineStages;

/// RAG_FUSION: walks the task plan in dependency order, retrieving
/// evidence for every step, then fuses the step evidence into one set.
#[derive(Debug, Default)]
pub struct PlannedProcessor;

#[async_trait]
impl IQueryProcessor for PlannedProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::RagFusion
    }

    async fn gather(
        &self,
        stages: &PipelineStages,
        exec: &mut QueryExecution,
    ) -> RelayResult<Vec<RetrievedContext>> {
        exec.enter(Stage::Planning);
        let plan: TaskPlan = exec
            .intent
            .task_plan
            .clone()
            .filter(TaskPlan::has_tasks)
            .ok_or_else(|| RelayError::PlanNotFound {
                reason: "intent carries no task plan".to_string(),
            })?;
        let waves = execution_waves(&plan)?;

        let mut context = TaskExecutionContext::new();
        let mut evidence: Vec<RetrievedContext> = Vec::new();
        for wave in &waves {
            for &step in wave {
                let Some(node) = plan.step(step) else {
                    continue;
                };
                if !context.is_ready(node) {
                    // execution_waves guarantees readiness
                    continue;
                }
                let attempt = context.record_attempt(&node.tool_name);
                let outcome = stages.retrieve(exec, &node.description, None).await?;
                debug!(
                    step,
                    tool = %node.tool_name,
                    attempt,
                    contexts = outcome.contexts.len(),
                    "plan step retrieved"
                );
                let summary = format!(
                    "step {step}: {} contexts for '{}'",
                    outcome.contexts.len(),
                    node.description
                );
                context.put(format!("step.{step}"), summary.clone());
                context.set_last_response(summary);
                context.mark_completed(step);
                evidence.extend(outcome.contexts);
            }
        }

        let completed = context.completed_steps().count();
        exec.annotate("plan_steps", plan.tasks.len());
        exec.annotate("plan_steps_completed", completed);
        let fused = fuse(evidence, exec.params.max_contexts);
        info!(
            steps = completed,
            contexts = fused.len(),
            "plan evidence fused"
        );
        Ok(fused)
    }
}

/// Deduplicate by chunk keeping the best-scoring copy, order by chunk
/// score descending, and cap at `max_contexts`.
pub fn fuse(evidence: Vec<RetrievedContext>, max_contexts: usize) -> Vec<RetrievedContext> {
    let mut best: HashMap<(String, u32), RetrievedContext> = HashMap::new();
    let mut order: Vec<(String, u32)> = Vec::new();
    for ctx in evidence {
        let key = (ctx.chunk.document_id.clone(), ctx.chunk.chunk_index);
        match best.get_mut(&key) {
            Some(existing) => {
                if ctx.chunk.score > existing.chunk.score {
                    *existing = ctx;
                }
            }
            None => {
                order.push(key.clone());
                best.insert(key, ctx);
            }
        }
    }
    let mut fused: Vec<RetrievedContext> = order
        .into_iter()
        .filter_map(|key| best.remove(&key))
        .collect();
    // stable: equal scores keep first-seen order
    fused.sort_by(|a, b| b.chunk.score.total_cmp(&a.chunk.score));
    fused.truncate(max_contexts);
    fused
}
