//! The immutable snapshot a detection pass runs against.

use crate::rules::LexicalIndex;
use crate::semantic::SemanticRouteTable;

/// Lexical rules plus semantic routes. Built off to the side on refresh
/// and swapped in whole.
#[derive(Debug, Clone, Default)]
pub struct CascadeIndex {
    pub lexical: LexicalIndex,
    pub semantic: SemanticRouteTable,
    pub built_at_ms: i64,
}

impl CascadeIndex {
    pub fn stats(&self) -> RouteStats {
        RouteStats {
            lexical_rules: self.lexical.len(),
            skipped_rules: self.lexical.skipped(),
            semantic_routes: self.semantic.len(),
            examples: self.semantic.example_count(),
        }
    }
}

/// Size of a freshly built index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteStats {
    pub lexical_rules: usize,
    pub skipped_rules: usize,
    pub semantic_routes: usize,
    pub examples: usize,
}
