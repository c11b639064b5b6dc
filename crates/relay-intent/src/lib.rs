//! # relay-intent
//!
//! Intent detection cascade. Lexical rules first, then semantic routes
//! over embedded example phrases, then the language-model planner. Rules
//! are compiled into an immutable index that is rebuilt on refresh and
//! swapped in atomically.

pub mod cascade;
pub mod detectors;
pub mod index;
pub mod rules;
pub mod semantic;

pub use cascade::IntentCascade;
pub use detectors::{CascadeDecision, Detection, IIntentDetector};
pub use index::{CascadeIndex, RouteStats};
pub use rules::{LexicalIndex, MatcherRegistry};
pub use semantic::SemanticRouteTable;
