//! Routing decision tracking.
//!
//! A side channel: the cascade records one [`DetectorResult`] per detector
//! into a [`DecisionRecorder`], then hands the finished decision to a
//! [`PublisherSet`]. Nothing here can block or fail the main path.
//!
//! [`DetectorResult`]: relay_core::models::DetectorResult

pub mod publisher;
pub mod recorder;

pub use publisher::{ChannelPublisher, IRoutingDecisionPublisher, LogPublisher, PublisherSet};
pub use recorder::DecisionRecorder;
