//! Rule matchers, keyed by rule type.
//!
//! Each matcher compiles a rule into a [`Pattern`] once, when the index is
//! built. Detection only evaluates compiled patterns.

use std::collections::HashMap;

use regex::Regex;
use relay_core::models::{IntentRule, MatchMode, RuleType};

/// A compiled rule predicate over trimmed query text. Case-sensitive.
#[derive(Debug, Clone)]
pub enum Pattern {
    Exact(String),
    Contains(String),
    Prefix(String),
    Suffix(String),
    /// Anchored so the whole query must match.
    FullMatch(Regex),
}

impl Pattern {
    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim();
        match self {
            Self::Exact(s) => text == s,
            Self::Contains(s) => text.contains(s.as_str()),
            Self::Prefix(s) => text.starts_with(s.as_str()),
            Self::Suffix(s) => text.ends_with(s.as_str()),
            Self::FullMatch(re) => re.is_match(text),
        }
    }

    /// Compile `source` as a full-match regex.
    pub fn full_match(source: &str) -> Result<Self, String> {
        Regex::new(&format!("^(?:{source})$"))
            .map(Self::FullMatch)
            .map_err(|e| e.to_string())
    }
}

pub trait RuleMatcher: Send + Sync {
    /// Compile `rule`, or explain why it cannot be used.
    fn compile(&self, rule: &IntentRule) -> Result<Pattern, String>;
}

/// KEYWORD rules: literal comparison per match mode.
#[derive(Debug, Default)]
pub struct KeywordMatcher;

impl RuleMatcher for KeywordMatcher {
    fn compile(&self, rule: &IntentRule) -> Result<Pattern, String> {
        let content = rule.content.trim();
        if content.is_empty() {
            return Err("empty keyword".to_string());
        }
        let content = content.to_string();
        Ok(match rule.effective_match_mode() {
            MatchMode::Exact => Pattern::Exact(content),
            MatchMode::Contains => Pattern::Contains(content),
            MatchMode::Prefix => Pattern::Prefix(content),
            MatchMode::Suffix => Pattern::Suffix(content),
            MatchMode::Regex => Pattern::full_match(&content)?,
        })
    }
}

/// REGEX rules: full-match regular expressions.
#[derive(Debug, Default)]
pub struct RegexMatcher;

impl RuleMatcher for RegexMatcher {
    fn compile(&self, rule: &IntentRule) -> Result<Pattern, String> {
        if rule.content.trim().is_empty() {
            return Err("empty pattern".to_string());
        }
        Pattern::full_match(&rule.content)
    }
}

/// Rule type → matcher, built once.
pub struct MatcherRegistry {
    matchers: HashMap<RuleType, Box<dyn RuleMatcher>>,
}

impl MatcherRegistry {
    pub fn empty() -> Self {
        Self {
            matchers: HashMap::new(),
        }
    }

    /// KEYWORD and REGEX matchers.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(RuleType::Keyword, Box::new(KeywordMatcher));
        registry.register(RuleType::Regex, Box::new(RegexMatcher));
        registry
    }

    pub fn register(&mut self, rule_type: RuleType, matcher: Box<dyn RuleMatcher>) {
        self.matchers.insert(rule_type, matcher);
    }

    pub fn compile(&self, rule: &IntentRule) -> Result<Pattern, String> {
        let matcher = self
            .matchers
            .get(&rule.rule_type)
            .ok_or_else(|| format!("no matcher for {:?} rules", rule.rule_type))?;
        matcher.compile(rule)
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
