use crate::errors::RelayResult;
use crate::models::{PlannerClassification, QueryIntent, TaskPlan};

/// Language-model planner.
pub trait ILanguageModelPlanner: Send + Sync {
    /// Classify a query and propose an optional multi-step plan.
    fn classify(&self, query: &str) -> RelayResult<PlannerClassification>;

    /// Produce a dependency-ordered plan for a multi-step intent.
    fn plan(&self, query: &str, intent: &QueryIntent) -> RelayResult<TaskPlan>;
}
