use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::evaluation::EvaluationScores;
use super::intent::ProcessorKind;
use super::query::{Query, QueryStatus};
use super::retrieval::RetrievedContext;

/// Max characters of chunk content carried in a source snippet.
pub const SNIPPET_CHARS: usize = 240;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// Structured evidence metadata attached to a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// `{document_id}#{chunk_index}`.
    pub id: String,
    pub document_id: String,
    pub title: Option<String>,
    pub snippet: String,
    pub source: Option<String>,
    pub score: f64,
    pub span: SourceSpan,
}

impl SourceRef {
    pub fn from_context(context: &RetrievedContext) -> Self {
        let chunk = &context.chunk;
        Self {
            id: format!("{}#{}", chunk.document_id, chunk.chunk_index),
            document_id: chunk.document_id.clone(),
            title: chunk.title.clone(),
            snippet: chunk.content.chars().take(SNIPPET_CHARS).collect(),
            source: chunk.source.clone(),
            score: chunk.score,
            span: SourceSpan {
                start: chunk.start_pos,
                end: chunk.end_pos,
            },
        }
    }
}

/// The answer record for one query attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub query_id: String,
    pub session_id: Option<String>,
    pub answer: Option<String>,
    pub sources: Vec<SourceRef>,
    pub evaluation: Option<EvaluationScores>,
    pub status: QueryStatus,
    pub error_message: Option<String>,
    pub timestamp_ms: i64,
    pub latency_ms: u64,
    pub processing_type: ProcessorKind,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Response {
    /// A fresh response in PROCESSING state for `query`.
    pub fn processing(query: &Query, processing_type: ProcessorKind, now_ms: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query_id: query.id.clone(),
            session_id: query.session_id.clone(),
            answer: None,
            sources: Vec::new(),
            evaluation: None,
            status: QueryStatus::Processing,
            error_message: None,
            timestamp_ms: now_ms,
            latency_ms: 0,
            processing_type,
            metadata: BTreeMap::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == QueryStatus::Failed
    }

    pub fn mark_failed(&mut self, error: impl Into<String>, latency_ms: u64) {
        self.status = QueryStatus::Failed;
        self.error_message = Some(error.into());
        self.latency_ms = latency_ms;
    }
}
