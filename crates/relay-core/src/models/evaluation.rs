use serde::{Deserialize, Serialize};

/// Neutral value substituted for every dimension when evaluation fails.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Answer quality scores on a 1 to 10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScores {
    pub faithfulness: f64,
    pub relevance: f64,
    pub context_relevance: f64,
    pub factual_consistency: f64,
    pub completeness: f64,
    pub conciseness: f64,
    pub total_score: f64,
    pub reasoning: Option<String>,
    pub error: Option<String>,
}

impl EvaluationScores {
    /// Neutral scores carrying the evaluation error as reasoning.
    pub fn neutral(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            faithfulness: NEUTRAL_SCORE,
            relevance: NEUTRAL_SCORE,
            context_relevance: NEUTRAL_SCORE,
            factual_consistency: NEUTRAL_SCORE,
            completeness: NEUTRAL_SCORE,
            conciseness: NEUTRAL_SCORE,
            total_score: NEUTRAL_SCORE,
            reasoning: Some(error.clone()),
            error: Some(error),
        }
    }

    pub fn is_neutral_fallback(&self) -> bool {
        self.error.is_some()
    }

    /// Faithfulness normalized to [0, 1].
    pub fn faithfulness_ratio(&self) -> f64 {
        self.faithfulness / 10.0
    }

    /// Relevance normalized to [0, 1].
    pub fn relevance_ratio(&self) -> f64 {
        self.relevance / 10.0
    }
}
