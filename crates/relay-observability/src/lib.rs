//! # relay-observability
//!
//! Tracing setup and span definitions, routing decision tracking with
//! pluggable publishers, and the per-query performance log.

pub mod query_log;
pub mod tracing_setup;
pub mod tracking;

pub use query_log::{QueryLog, QueryLogEntry};
pub use tracking::{
    ChannelPublisher, DecisionRecorder, IRoutingDecisionPublisher, LogPublisher, PublisherSet,
};
