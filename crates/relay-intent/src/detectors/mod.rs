//! Detectors, run by the cascade in a fixed order.

pub mod planner;
pub mod rule_based;
pub mod semantic;

use async_trait::async_trait;
use relay_core::errors::RelayResult;
use relay_core::models::QueryIntent;

use crate::index::CascadeIndex;

pub use planner::PlannerDetector;
pub use rule_based::RuleBasedDetector;
pub use semantic::SemanticDetector;

/// What the cascade does after a detector has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeDecision {
    /// The candidate is final, whatever its confidence.
    Locked,
    /// Keep the candidate, if any, and run the next detector.
    ContinueCascade,
    /// The candidate is final; no further detector runs.
    StopCascade,
}

/// Outcome of one detector run.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub decision: CascadeDecision,
    pub candidate: Option<QueryIntent>,
    pub reason: String,
    /// The candidate's plan came from the plan cache.
    pub cached: bool,
}

impl Detection {
    pub fn unmatched(reason: impl Into<String>) -> Self {
        Self {
            decision: CascadeDecision::ContinueCascade,
            candidate: None,
            reason: reason.into(),
            cached: false,
        }
    }

    pub fn matched(decision: CascadeDecision, intent: QueryIntent, reason: impl Into<String>) -> Self {
        Self {
            decision,
            candidate: Some(intent),
            reason: reason.into(),
            cached: false,
        }
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    pub fn confidence(&self) -> f64 {
        self.candidate.as_ref().map_or(0.0, |c| c.confidence)
    }

    /// Decision implied by a matched rule's flags.
    pub fn decision_for(lock_processor: bool, allow_cascade: bool) -> CascadeDecision {
        if lock_processor {
            CascadeDecision::Locked
        } else if allow_cascade {
            CascadeDecision::ContinueCascade
        } else {
            CascadeDecision::StopCascade
        }
    }
}

#[async_trait]
pub trait IIntentDetector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn detect(&self, query: &str, index: &CascadeIndex) -> RelayResult<Detection>;
}
