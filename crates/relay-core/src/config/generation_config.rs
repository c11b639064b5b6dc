use serde::{Deserialize, Serialize};

use super::defaults;

/// Answer generation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f64,
    /// Temperature used for decision-support queries.
    pub decision_temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            temperature: defaults::DEFAULT_TEMPERATURE,
            decision_temperature: defaults::DEFAULT_DECISION_TEMPERATURE,
            max_tokens: defaults::DEFAULT_MAX_TOKENS,
        }
    }
}
