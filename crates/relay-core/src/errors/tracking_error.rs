/// Routing decision tracking errors. Logged by the publisher set, never
/// propagated to a query.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("publisher {publisher} failed: {reason}")]
    PublishFailed { publisher: String, reason: String },
}
