//! Immutable lexical rule index in evaluation order.

use relay_core::models::{IntentRule, RuleType};
use tracing::warn;

use super::matcher::{MatcherRegistry, Pattern};

/// A rule with its compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: IntentRule,
    pub pattern: Pattern,
}

impl CompiledRule {
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.matches(text)
    }
}

/// Active KEYWORD and REGEX rules, priority descending then id ascending.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    rules: Vec<CompiledRule>,
    skipped: usize,
}

impl LexicalIndex {
    /// Compile every active lexical rule. Rules that fail to compile are
    /// logged and left out.
    pub fn build(mut rules: Vec<IntentRule>, registry: &MatcherRegistry) -> Self {
        rules.retain(|r| r.is_active && RuleType::LEXICAL.contains(&r.rule_type));
        rules.sort_by(IntentRule::precedence);

        let mut compiled = Vec::with_capacity(rules.len());
        let mut skipped = 0;
        for rule in rules {
            match registry.compile(&rule) {
                Ok(pattern) => compiled.push(CompiledRule { rule, pattern }),
                Err(reason) => {
                    skipped += 1;
                    warn!(rule_id = rule.id, reason = %reason, "intent rule skipped");
                }
            }
        }
        Self {
            rules: compiled,
            skipped,
        }
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules dropped at build time.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
