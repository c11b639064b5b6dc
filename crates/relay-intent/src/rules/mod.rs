//! Lexical rules: matcher registry and the compiled rule index.

pub mod index;
pub mod matcher;

pub use index::{CompiledRule, LexicalIndex};
pub use matcher::{KeywordMatcher, MatcherRegistry, Pattern, RegexMatcher, RuleMatcher};
