use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use relay_core::errors::{PlanningError, RelayResult};
use relay_core::models::{PlannerClassification, QueryIntent, TaskNode, TaskPlan, TaskType, TopicDomain};
use relay_core::traits::ILanguageModelPlanner;

/// Planner double returning a fixed plan and classification while counting
/// how often each entry point is called.
pub struct CountingPlanner {
    plan: TaskPlan,
    classification: PlannerClassification,
    plan_calls: AtomicUsize,
    classify_calls: AtomicUsize,
    fail_plan: AtomicBool,
    fail_classify: AtomicBool,
}

impl CountingPlanner {
    pub fn new(plan: TaskPlan) -> Self {
        let classification = PlannerClassification {
            task_type: Some(TaskType::Analysis),
            domain: Some(TopicDomain::General),
            summary: Some(plan.summary.clone()),
            plan: plan.clone(),
        };
        Self {
            plan,
            classification,
            plan_calls: AtomicUsize::new(0),
            classify_calls: AtomicUsize::new(0),
            fail_plan: AtomicBool::new(false),
            fail_classify: AtomicBool::new(false),
        }
    }

    /// A three-step compare-then-recommend plan: steps 1 and 2 are
    /// independent, step 3 depends on both.
    pub fn three_step() -> Self {
        Self::new(TaskPlan::new(
            "compare plans and recommend one",
            vec![
                TaskNode::new(1, "collect plan A terms", vec![]),
                TaskNode::new(2, "collect plan B terms", vec![]),
                TaskNode::new(3, "compare and recommend", vec![1, 2]),
            ],
        ))
    }

    pub fn with_classification(mut self, classification: PlannerClassification) -> Self {
        self.classification = classification;
        self
    }

    pub fn set_plan_failing(&self, failing: bool) {
        self.fail_plan.store(failing, Ordering::SeqCst);
    }

    pub fn set_classify_failing(&self, failing: bool) {
        self.fail_classify.store(failing, Ordering::SeqCst);
    }

    pub fn plan_calls(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }
}

impl ILanguageModelPlanner for CountingPlanner {
    fn classify(&self, _query: &str) -> RelayResult<PlannerClassification> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_classify.load(Ordering::SeqCst) {
            return Err(PlanningError::PlannerFailed {
                reason: "classifier unavailable".to_string(),
            }
            .into());
        }
        Ok(self.classification.clone())
    }

    fn plan(&self, _query: &str, _intent: &QueryIntent) -> RelayResult<TaskPlan> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_plan.load(Ordering::SeqCst) {
            return Err(PlanningError::PlannerFailed {
                reason: "planner unavailable".to_string(),
            }
            .into());
        }
        Ok(self.plan.clone())
    }
}
