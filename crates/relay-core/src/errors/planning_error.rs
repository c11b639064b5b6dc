/// Task planning errors.
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("planner failed: {reason}")]
    PlannerFailed { reason: String },

    #[error("duplicate step {step} in plan")]
    DuplicateStep { step: u32 },

    #[error("step {step} depends on unknown step {dependency}")]
    UnknownDependency { step: u32, dependency: u32 },

    #[error("plan contains a dependency cycle through steps {steps:?}")]
    CyclicPlan { steps: Vec<u32> },
}
