//! Configuration for Relay.
//! TOML-based; every section falls back to the compiled defaults in [`defaults`].

pub mod defaults;
pub mod embedding_config;
pub mod evaluation_config;
pub mod generation_config;
pub mod intent_config;
pub mod observability_config;
pub mod planning_config;
pub mod retrieval_config;
pub mod timeout_config;

pub use embedding_config::EmbeddingConfig;
pub use evaluation_config::EvaluationConfig;
pub use generation_config::GenerationConfig;
pub use intent_config::IntentConfig;
pub use observability_config::ObservabilityConfig;
pub use planning_config::PlanningConfig;
pub use retrieval_config::RetrievalConfig;
pub use timeout_config::TimeoutConfig;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    pub intent: IntentConfig,
    pub embedding: EmbeddingConfig,
    pub planning: PlanningConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub evaluation: EvaluationConfig,
    pub timeouts: TimeoutConfig,
    pub observability: ObservabilityConfig,
}

impl RelayConfig {
    /// Parse and validate a TOML document. Missing sections and fields
    /// take their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("intent.semantic_threshold", self.intent.semantic_threshold)?;
        check_unit("intent.planner_confidence", self.intent.planner_confidence)?;
        check_unit(
            "intent.short_query_confidence",
            self.intent.short_query_confidence,
        )?;
        check_unit(
            "intent.cached_plan_confidence",
            self.intent.cached_plan_confidence,
        )?;
        check_unit(
            "intent.default_rule_confidence",
            self.intent.default_rule_confidence,
        )?;
        check_unit("intent.fallback_confidence", self.intent.fallback_confidence)?;

        check_unit(
            "planning.similarity_threshold",
            self.planning.similarity_threshold,
        )?;
        check_positive("planning.bucket_dims", self.planning.bucket_dims)?;
        check_positive("planning.bucket_capacity", self.planning.bucket_capacity)?;
        check_positive("planning.max_entries", self.planning.max_entries)?;
        if self.planning.ttl_secs == 0 {
            return Err(invalid("planning.ttl_secs", "must be greater than 0"));
        }

        check_positive("retrieval.top_k", self.retrieval.top_k)?;
        check_positive(
            "retrieval.candidate_multiplier",
            self.retrieval.candidate_multiplier,
        )?;
        check_positive(
            "retrieval.per_doc_max_chunks",
            self.retrieval.per_doc_max_chunks,
        )?;
        check_positive("retrieval.max_contexts", self.retrieval.max_contexts)?;
        if !(-1.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(invalid(
                "retrieval.min_score",
                "must be between -1.0 and 1.0",
            ));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(invalid(
                "generation.temperature",
                "must be between 0.0 and 2.0",
            ));
        }
        if self.generation.max_tokens == 0 {
            return Err(invalid("generation.max_tokens", "must be greater than 0"));
        }

        check_unit(
            "evaluation.strict_min_faithfulness",
            self.evaluation.strict_min_faithfulness,
        )?;
        check_unit(
            "evaluation.lenient_min_faithfulness",
            self.evaluation.lenient_min_faithfulness,
        )?;
        check_unit("evaluation.min_relevance", self.evaluation.min_relevance)?;

        let timeouts = [
            ("timeouts.embedding_ms", self.timeouts.embedding_ms),
            ("timeouts.vector_search_ms", self.timeouts.vector_search_ms),
            ("timeouts.generation_ms", self.timeouts.generation_ms),
            ("timeouts.evaluation_ms", self.timeouts.evaluation_ms),
            ("timeouts.planner_ms", self.timeouts.planner_ms),
            ("timeouts.persistence_ms", self.timeouts.persistence_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(invalid(field, "must be greater than 0"));
            }
        }

        check_positive(
            "observability.query_log_capacity",
            self.observability.query_log_capacity,
        )?;
        check_positive(
            "observability.decision_channel_capacity",
            self.observability.decision_channel_capacity,
        )?;
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "must be between 0.0 and 1.0"))
    }
}

fn check_positive(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(invalid(field, "must be greater than 0"))
    } else {
        Ok(())
    }
}
