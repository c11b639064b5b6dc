use serde::{Deserialize, Serialize};

use super::defaults;

/// Thresholds for the strict and lenient evaluation strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub strict_min_faithfulness: f64,
    pub lenient_min_faithfulness: f64,
    pub min_relevance: f64,
    /// Evaluation retries allowed under the strict strategy.
    pub strict_max_retry: u32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            strict_min_faithfulness: defaults::DEFAULT_STRICT_MIN_FAITHFULNESS,
            lenient_min_faithfulness: defaults::DEFAULT_LENIENT_MIN_FAITHFULNESS,
            min_relevance: defaults::DEFAULT_MIN_RELEVANCE,
            strict_max_retry: defaults::DEFAULT_STRICT_MAX_RETRY,
        }
    }
}
