use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::intent::{Complexity, IntentSource, ProcessorKind, QueryIntent, TaskType, TopicDomain};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    Keyword,
    Regex,
    SemanticExample,
}

impl RuleType {
    /// Rule types evaluated by the lexical matchers.
    pub const LEXICAL: [RuleType; 2] = [Self::Keyword, Self::Regex];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMode {
    Exact,
    Contains,
    Prefix,
    Suffix,
    Regex,
}

/// A routing rule managed through the admin surface and loaded into the
/// in-memory cascade index on refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRule {
    pub id: i64,
    pub rule_type: RuleType,
    #[serde(default)]
    pub match_mode: Option<MatchMode>,
    pub content: String,
    pub task_type: TaskType,
    pub domain: TopicDomain,
    pub target_processor: ProcessorKind,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Higher wins.
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub allow_cascade: bool,
    #[serde(default)]
    pub lock_processor: bool,
    #[serde(default)]
    pub route_key: Option<String>,
    #[serde(default)]
    pub semantic_threshold: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl IntentRule {
    /// REGEX rules always match as regexes; other rules default to CONTAINS.
    pub fn effective_match_mode(&self) -> MatchMode {
        match self.rule_type {
            RuleType::Regex => MatchMode::Regex,
            _ => self.match_mode.unwrap_or(MatchMode::Contains),
        }
    }

    /// Semantic grouping key, defaulting to the task type label.
    pub fn route_key(&self) -> String {
        match self.route_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => self.task_type.as_str().to_string(),
        }
    }

    /// Evaluation order: priority descending, then id ascending.
    pub fn precedence(a: &IntentRule, b: &IntentRule) -> Ordering {
        b.priority.cmp(&a.priority).then(a.id.cmp(&b.id))
    }

    /// Build the intent a match of this rule produces.
    pub fn to_intent(&self, source: IntentSource, confidence: f64, reason: &str) -> QueryIntent {
        let processor = self.target_processor;
        QueryIntent {
            complexity: Complexity::Medium,
            multi_step: processor != ProcessorKind::Basic,
            lock_processor: self.lock_processor,
            allow_cascade: self.allow_cascade,
            secondary_processors: BTreeSet::from([ProcessorKind::Basic]),
            summary: Some(reason.to_string()),
            ..QueryIntent::new(source, self.task_type, self.domain, processor, confidence)
        }
        .with_attribute("rule_id", self.id.to_string())
        .with_attribute("route_key", self.route_key())
    }
}
