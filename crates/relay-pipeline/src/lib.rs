//! # relay-pipeline
//!
//! Orchestration for one query: intent detection, optional planning,
//! strategy mapping, processor routing, and the shared
//! embed → retrieve → generate → evaluate → persist stages.
//!
//! [`QueryService::process_query`] is the entry point. It only returns
//! `Err` for a malformed request; every later failure comes back as a
//! FAILED [`relay_core::models::Response`].

pub mod execution;
pub mod processors;
pub mod router;
pub mod service;
pub mod stages;
pub mod strategy;

pub use execution::{QueryExecution, Stage};
pub use processors::{BasicProcessor, IQueryProcessor, PlannedProcessor};
pub use router::QueryRouter;
pub use service::{Capabilities, QueryService};
pub use stages::PipelineStages;
pub use strategy::{EvaluationMode, EvaluationStrategy, QueryStrategy, StrategyMapper};
