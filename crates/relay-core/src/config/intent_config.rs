use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::ProcessorKind;

/// Intent detection cascade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentConfig {
    /// Global semantic route threshold, used when a route sets none.
    pub semantic_threshold: f64,
    /// Whether the language-model planner runs as the last detector.
    pub planner_enabled: bool,
    /// Queries shorter than this (in characters, trimmed) count as short.
    pub short_query_chars: usize,
    /// Fallback intents for queries longer than this are HIGH complexity.
    pub long_query_chars: usize,
    pub planner_confidence: f64,
    pub short_query_confidence: f64,
    /// Confidence assigned to a planner intent served from the plan cache.
    pub cached_plan_confidence: f64,
    /// Used for rules that carry no confidence of their own.
    pub default_rule_confidence: f64,
    pub fallback_confidence: f64,
    /// Publish a routing decision for every detection.
    pub tracking_enabled: bool,
    /// Processor serving selectors that have no registered processor.
    /// `None` makes such queries fail with `RouteNotFound`.
    pub default_processor: Option<ProcessorKind>,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            semantic_threshold: defaults::DEFAULT_SEMANTIC_THRESHOLD,
            planner_enabled: defaults::DEFAULT_PLANNER_ENABLED,
            short_query_chars: defaults::DEFAULT_SHORT_QUERY_CHARS,
            long_query_chars: defaults::DEFAULT_LONG_QUERY_CHARS,
            planner_confidence: defaults::DEFAULT_PLANNER_CONFIDENCE,
            short_query_confidence: defaults::DEFAULT_SHORT_QUERY_CONFIDENCE,
            cached_plan_confidence: defaults::DEFAULT_CACHED_PLAN_CONFIDENCE,
            default_rule_confidence: defaults::DEFAULT_RULE_CONFIDENCE,
            fallback_confidence: defaults::DEFAULT_FALLBACK_CONFIDENCE,
            tracking_enabled: defaults::DEFAULT_TRACKING_ENABLED,
            default_processor: Some(defaults::DEFAULT_PROCESSOR),
        }
    }
}
