use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use relay_core::errors::{RelayResult, TrackingError};
use relay_core::models::RoutingDecision;
use tokio::sync::mpsc;

/// Characters of query text included in decision logs.
const LOG_QUERY_CHARS: usize = 50;

/// A sink for routing decisions.
pub trait IRoutingDecisionPublisher: Send + Sync {
    fn publish(&self, decision: &RoutingDecision) -> RelayResult<()>;

    fn name(&self) -> &str;
}

/// Logs each decision through `tracing`. The default sink.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl IRoutingDecisionPublisher for LogPublisher {
    fn publish(&self, decision: &RoutingDecision) -> RelayResult<()> {
        let query: String = decision.query_text.chars().take(LOG_QUERY_CHARS).collect();
        let intent = &decision.final_intent;
        if decision.detector_results.is_empty() {
            tracing::debug!(
                event = "routing_decision",
                query = %query,
                source = ?intent.source,
                latency_ms = decision.latency_ms,
                "routing decided without detectors"
            );
            return Ok(());
        }
        tracing::info!(
            event = "routing_decision",
            query = %query,
            user_id = ?decision.user_id,
            source = ?intent.source,
            task_type = intent.task_type.as_str(),
            processor = intent.recommended_processor.as_str(),
            confidence = intent.confidence,
            detectors = decision.detector_results.len(),
            matched = decision.matched_detectors().count(),
            cached = decision.cached,
            latency_ms = decision.latency_ms,
            reason = %decision.reason,
            "routing decided"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Forwards decisions into a bounded channel for an event or metrics
/// consumer. Never waits: when the channel is full the decision is dropped.
pub struct ChannelPublisher {
    sender: mpsc::Sender<RoutingDecision>,
}

impl ChannelPublisher {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<RoutingDecision>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl IRoutingDecisionPublisher for ChannelPublisher {
    fn publish(&self, decision: &RoutingDecision) -> RelayResult<()> {
        match self.sender.try_send(decision.clone()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("routing decision channel full, dropping decision");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(TrackingError::PublishFailed {
                publisher: self.name().to_string(),
                reason: "receiver dropped, channel closed".to_string(),
            }
            .into()),
        }
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// Fans a decision out to every registered publisher. Publisher errors
/// and panics are logged and swallowed.
#[derive(Default)]
pub struct PublisherSet {
    publishers: Vec<Arc<dyn IRoutingDecisionPublisher>>,
}

impl PublisherSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding only the [`LogPublisher`].
    pub fn with_log() -> Self {
        let mut set = Self::new();
        set.register(Arc::new(LogPublisher));
        set
    }

    pub fn register(&mut self, publisher: Arc<dyn IRoutingDecisionPublisher>) {
        self.publishers.push(publisher);
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }

    pub fn publish(&self, decision: &RoutingDecision) {
        for publisher in &self.publishers {
            let outcome = catch_unwind(AssertUnwindSafe(|| publisher.publish(decision)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(
                    publisher = publisher.name(),
                    error = %e,
                    "routing decision publish failed"
                ),
                Err(_) => tracing::warn!(
                    publisher = publisher.name(),
                    "routing decision publisher panicked"
                ),
            }
        }
    }
}
