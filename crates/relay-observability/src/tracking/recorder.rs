use std::time::{Duration, Instant};

use relay_core::models::{DetectorResult, QueryIntent, RoutingDecision};

/// Accumulates detector outcomes for one cascade run.
pub struct DecisionRecorder {
    query_text: String,
    user_id: Option<String>,
    session_id: Option<String>,
    timestamp_ms: i64,
    started: Instant,
    results: Vec<DetectorResult>,
    cached: bool,
}

impl DecisionRecorder {
    pub fn start(
        query_text: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            query_text: query_text.to_string(),
            user_id: user_id.map(str::to_string),
            session_id: session_id.map(str::to_string),
            timestamp_ms,
            started: Instant::now(),
            results: Vec::new(),
            cached: false,
        }
    }

    /// Record one detector invocation, matched or not.
    pub fn record(
        &mut self,
        detector: &str,
        matched: bool,
        confidence: f64,
        reason: impl Into<String>,
        latency: Duration,
    ) {
        self.results.push(DetectorResult {
            detector: detector.to_string(),
            matched,
            confidence,
            reason: reason.into(),
            latency_ms: millis(latency),
        });
    }

    pub fn mark_cached(&mut self) {
        self.cached = true;
    }

    pub fn results(&self) -> &[DetectorResult] {
        &self.results
    }

    /// Seal the record with the final intent and total latency.
    pub fn finish(self, final_intent: QueryIntent, reason: impl Into<String>) -> RoutingDecision {
        RoutingDecision {
            latency_ms: millis(self.started.elapsed()),
            query_text: self.query_text,
            user_id: self.user_id,
            session_id: self.session_id,
            timestamp_ms: self.timestamp_ms,
            detector_results: self.results,
            final_intent,
            reason: reason.into(),
            cached: self.cached,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
