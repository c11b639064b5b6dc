use serde::{Deserialize, Serialize};

use super::intent::QueryIntent;

/// Outcome of one detector invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorResult {
    pub detector: String,
    pub matched: bool,
    pub confidence: f64,
    pub reason: String,
    pub latency_ms: u64,
}

/// Observability record of one cascade run. Written once, then published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub query_text: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub timestamp_ms: i64,
    pub detector_results: Vec<DetectorResult>,
    pub final_intent: QueryIntent,
    pub reason: String,
    pub latency_ms: u64,
    /// The final intent reused a cached task plan.
    pub cached: bool,
}

impl RoutingDecision {
    pub fn matched_detectors(&self) -> impl Iterator<Item = &DetectorResult> {
        self.detector_results.iter().filter(|r| r.matched)
    }
}
