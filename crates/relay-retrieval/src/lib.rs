//! # relay-retrieval
//!
//! Turns raw nearest-neighbor rows into a bounded, document-diversified,
//! window-expanded evidence set.
//!
//! [`aggregation::select`] caps and scores hits per document,
//! [`expansion`] works out which neighbors to pull in, and
//! [`aggregation::assemble`] emits the final ordered contexts.
//! [`RetrievalEngine`] drives the external calls around them.

pub mod aggregation;
pub mod engine;
pub mod expansion;

pub use aggregation::{assemble, document_score, select, RankedDocument, Selection};
pub use engine::{RetrievalEngine, RetrievalOutcome};
