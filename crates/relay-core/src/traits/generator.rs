use serde::{Deserialize, Serialize};

use crate::errors::RelayResult;

/// Parameters passed to the generation capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub require_citations: bool,
}

/// Language-model answer generation.
pub trait IGenerator: Send + Sync {
    fn generate(
        &self,
        query: &str,
        contexts: &[String],
        params: &GenerationParams,
    ) -> RelayResult<String>;
}
