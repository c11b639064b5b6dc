//! Intent → execution strategy mapping: which processor runs, with what
//! generation parameters, and how strictly the answer is evaluated.

use relay_core::config::{EvaluationConfig, GenerationConfig};
use relay_core::models::{IntentSource, ProcessorKind, QueryIntent, QueryParams, TaskType};
use relay_core::traits::GenerationParams;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationMode {
    Strict,
    Lenient,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationStrategy {
    pub mode: EvaluationMode,
    /// Non-BASIC processors may skip evaluation when this is false.
    pub enabled: bool,
    /// On the [0, 1] scale.
    pub min_faithfulness: f64,
    pub min_relevance: f64,
    /// Evaluation retries before neutral scores are substituted.
    pub max_retry: u32,
}

impl EvaluationStrategy {
    pub fn attempts(&self) -> u32 {
        self.max_retry.saturating_add(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryStrategy {
    pub processor: ProcessorKind,
    pub generation: GenerationParams,
    pub evaluation: EvaluationStrategy,
    pub clarification_required: bool,
}

pub struct StrategyMapper {
    generation: GenerationConfig,
    evaluation: EvaluationConfig,
}

impl StrategyMapper {
    pub fn new(generation: GenerationConfig, evaluation: EvaluationConfig) -> Self {
        Self {
            generation,
            evaluation,
        }
    }

    pub fn map(&self, intent: &QueryIntent, params: Option<&QueryParams>) -> QueryStrategy {
        let processor = params
            .and_then(|p| p.processor)
            .unwrap_or_else(|| select_processor(intent));

        let temperature = params.and_then(|p| p.temperature).unwrap_or(
            if intent.task_type == TaskType::DecisionSupport {
                self.generation.decision_temperature
            } else {
                self.generation.temperature
            },
        );
        let generation = GenerationParams {
            model: self.generation.model.clone(),
            temperature,
            max_tokens: params
                .and_then(|p| p.max_tokens)
                .unwrap_or(self.generation.max_tokens),
            require_citations: intent.task_type != TaskType::Chat,
        };

        QueryStrategy {
            processor,
            generation,
            evaluation: self.evaluation_for(intent.task_type),
            clarification_required: intent.requires_clarification,
        }
    }

    fn evaluation_for(&self, task_type: TaskType) -> EvaluationStrategy {
        let strict = matches!(
            task_type,
            TaskType::Analysis | TaskType::DecisionSupport | TaskType::OrderLookup
        );
        let (mode, min_faithfulness, max_retry) = if strict {
            (
                EvaluationMode::Strict,
                self.evaluation.strict_min_faithfulness,
                self.evaluation.strict_max_retry,
            )
        } else {
            (
                EvaluationMode::Lenient,
                self.evaluation.lenient_min_faithfulness,
                0,
            )
        };
        EvaluationStrategy {
            mode,
            // Small talk has no evidence to be faithful to.
            enabled: task_type != TaskType::Chat,
            min_faithfulness,
            min_relevance: self.evaluation.min_relevance,
            max_retry,
        }
    }
}

/// Plan → RAG_FUSION, then a detector's recommendation, then the task type.
fn select_processor(intent: &QueryIntent) -> ProcessorKind {
    if intent.has_plan() {
        return ProcessorKind::RagFusion;
    }
    if intent.lock_processor || intent.source != IntentSource::Fallback {
        return intent.recommended_processor;
    }
    match intent.task_type {
        TaskType::Comparison => ProcessorKind::MultiQuery,
        TaskType::Analysis | TaskType::DecisionSupport => ProcessorKind::StepBack,
        TaskType::Troubleshoot => ProcessorKind::Decomposition,
        _ => ProcessorKind::Basic,
    }
}

#[cfg(test)]
mod tests {
    use relay_core::models::{TaskNode, TaskPlan, TopicDomain};

    use super::*;

    fn mapper() -> StrategyMapper {
        StrategyMapper::new(GenerationConfig::default(), EvaluationConfig::default())
    }

    fn intent(source: IntentSource, task_type: TaskType, processor: ProcessorKind) -> QueryIntent {
        QueryIntent::new(source, task_type, TopicDomain::General, processor, 0.9)
    }

    #[test]
    fn plan_selects_rag_fusion() {
        let i = intent(IntentSource::LlmPlanner, TaskType::Analysis, ProcessorKind::Basic)
            .with_plan(TaskPlan::new("p", vec![TaskNode::new(1, "a", vec![])]));
        assert_eq!(mapper().map(&i, None).processor, ProcessorKind::RagFusion);
    }

    #[test]
    fn empty_plan_does_not_select_rag_fusion() {
        let i = intent(IntentSource::RuleBased, TaskType::Faq, ProcessorKind::Hyde)
            .with_plan(TaskPlan::default());
        assert_eq!(mapper().map(&i, None).processor, ProcessorKind::Hyde);
    }

    #[test]
    fn fallback_maps_by_task_type() {
        let mut i = QueryIntent::fallback("q", 0.3, 120);
        assert_eq!(mapper().map(&i, None).processor, ProcessorKind::Basic);
        i.task_type = TaskType::Troubleshoot;
        assert_eq!(mapper().map(&i, None).processor, ProcessorKind::Decomposition);
        i.task_type = TaskType::Comparison;
        assert_eq!(mapper().map(&i, None).processor, ProcessorKind::MultiQuery);
    }

    #[test]
    fn request_override_wins() {
        let i = intent(IntentSource::RuleBased, TaskType::Faq, ProcessorKind::Basic);
        let params = QueryParams {
            processor: Some(ProcessorKind::SelfRag),
            temperature: Some(1.5),
            max_tokens: Some(64),
            ..QueryParams::default()
        };
        let s = mapper().map(&i, Some(&params));
        assert_eq!(s.processor, ProcessorKind::SelfRag);
        assert_eq!(s.generation.temperature, 1.5);
        assert_eq!(s.generation.max_tokens, 64);
    }

    #[test]
    fn decision_support_is_cool_and_strict() {
        let i = intent(IntentSource::LlmPlanner, TaskType::DecisionSupport, ProcessorKind::Basic);
        let s = mapper().map(&i, None);
        assert_eq!(s.generation.temperature, 0.2);
        assert_eq!(s.evaluation.mode, EvaluationMode::Strict);
        assert_eq!(s.evaluation.min_faithfulness, 0.85);
        assert_eq!(s.evaluation.attempts(), 2);
    }

    #[test]
    fn faq_is_lenient_without_retry() {
        let i = intent(IntentSource::RuleBased, TaskType::Faq, ProcessorKind::Basic);
        let s = mapper().map(&i, None);
        assert_eq!(s.generation.temperature, 0.7);
        assert_eq!(s.evaluation.mode, EvaluationMode::Lenient);
        assert_eq!(s.evaluation.min_faithfulness, 0.6);
        assert_eq!(s.evaluation.attempts(), 1);
        assert!(s.generation.require_citations);
    }

    #[test]
    fn chat_needs_no_citations_or_evaluation() {
        let i = intent(IntentSource::RuleBased, TaskType::Chat, ProcessorKind::Basic);
        let s = mapper().map(&i, None);
        assert!(!s.generation.require_citations);
        assert!(!s.evaluation.enabled);
    }
}
