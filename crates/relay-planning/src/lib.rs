//! # relay-planning
//!
//! Multi-step task planning for the Relay pipeline.
//!
//! [`TaskPlanner`] consults the similarity-keyed [`TaskPlanCache`] before
//! calling the language-model planner. [`dag`] validates plans and orders
//! their steps; [`TaskExecutionContext`] carries per-execution state while
//! a plan runs.

pub mod cache;
pub mod context;
pub mod dag;
pub mod planner;

pub use cache::{bucket_key, CachedTaskPlan, PlanCacheStats, PlanHit, TaskPlanCache};
pub use context::TaskExecutionContext;
pub use dag::{execution_waves, validate_plan};
pub use planner::{PlanOutcome, TaskPlanner};
