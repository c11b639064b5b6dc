use serde::{Deserialize, Serialize};

use super::intent::ProcessorKind;
use super::retrieval::DocAggregation;
use crate::errors::{RelayError, RelayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryStatus {
    Created,
    Processing,
    Completed,
    Failed,
}

impl QueryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// Per-request overrides. Counts are signed so malformed values can be
/// rejected with a validation error instead of a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    pub top_k: Option<i64>,
    pub min_score: Option<f64>,
    pub index_name: Option<String>,
    pub candidate_multiplier: Option<i64>,
    pub doc_agg: Option<DocAggregation>,
    pub neighbor_window: Option<i64>,
    pub per_doc_max_chunks: Option<i64>,
    pub max_contexts: Option<i64>,
    /// Forces a route selector, bypassing strategy mapping.
    pub processor: Option<ProcessorKind>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Input to `ProcessQuery`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub params: Option<QueryParams>,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_id: None,
            session_id: None,
            params: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn validate(&self) -> RelayResult<()> {
        if self.text.trim().is_empty() {
            return Err(RelayError::validation("text", "query text must not be empty"));
        }
        if let Some(t) = self.params.as_ref().and_then(|p| p.temperature) {
            if !(0.0..=2.0).contains(&t) {
                return Err(RelayError::validation(
                    "temperature",
                    format!("must be within [0, 2], got {t}"),
                ));
            }
        }
        Ok(())
    }
}

/// A persisted query and its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: String,
    pub text: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub status: QueryStatus,
    /// Query embedding, reused by later stages once computed.
    pub vector: Option<Vec<f32>>,
    pub params: Option<QueryParams>,
    pub processing_type: Option<ProcessorKind>,
    pub error_message: Option<String>,
    pub created_at_ms: i64,
    pub completed_at_ms: Option<i64>,
    pub latency_ms: Option<u64>,
}

impl Query {
    pub fn from_request(request: &QueryRequest, now_ms: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: request.text.trim().to_string(),
            user_id: request.user_id.clone(),
            session_id: request.session_id.clone(),
            status: QueryStatus::Created,
            vector: None,
            params: request.params.clone(),
            processing_type: None,
            error_message: None,
            created_at_ms: now_ms,
            completed_at_ms: None,
            latency_ms: None,
        }
    }

    pub fn mark_processing(&mut self, kind: ProcessorKind) {
        self.status = QueryStatus::Processing;
        self.processing_type = Some(kind);
    }

    pub fn mark_completed(&mut self, now_ms: i64, latency_ms: u64) {
        self.status = QueryStatus::Completed;
        self.completed_at_ms = Some(now_ms);
        self.latency_ms = Some(latency_ms);
    }

    pub fn mark_failed(&mut self, error: impl Into<String>, now_ms: i64, latency_ms: u64) {
        self.status = QueryStatus::Failed;
        self.error_message = Some(error.into());
        self.completed_at_ms = Some(now_ms);
        self.latency_ms = Some(latency_ms);
    }
}
