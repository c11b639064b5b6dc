use std::sync::Arc;

use async_trait::async_trait;
use relay_core::blocking::call_blocking;
use relay_core::config::{IntentConfig, TimeoutConfig};
use relay_core::errors::RelayResult;
use relay_core::models::{
    Complexity, IntentSource, ProcessorKind, QueryIntent, TaskPlan, TaskType, TopicDomain,
};
use relay_core::traits::ILanguageModelPlanner;
use relay_planning::TaskPlanner;

use super::{CascadeDecision, Detection, IIntentDetector};
use crate::index::CascadeIndex;

/// Last resort: a cached plan for a similar query, else the language-model
/// classifier. Classified plans are remembered in the plan cache.
pub struct PlannerDetector {
    planner: Arc<dyn ILanguageModelPlanner>,
    task_planner: Arc<TaskPlanner>,
    config: IntentConfig,
    timeouts: TimeoutConfig,
}

impl PlannerDetector {
    pub fn new(
        planner: Arc<dyn ILanguageModelPlanner>,
        task_planner: Arc<TaskPlanner>,
        config: IntentConfig,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            planner,
            task_planner,
            config,
            timeouts,
        }
    }

    fn is_short(&self, query: &str) -> bool {
        query.trim().chars().count() < self.config.short_query_chars
    }

    fn planned_intent(
        &self,
        task_type: TaskType,
        domain: TopicDomain,
        plan: TaskPlan,
        confidence: f64,
        short: bool,
    ) -> QueryIntent {
        let multi_step = plan.has_tasks();
        let processor = if multi_step {
            ProcessorKind::RagFusion
        } else {
            ProcessorKind::Basic
        };
        let mut intent =
            QueryIntent::new(IntentSource::LlmPlanner, task_type, domain, processor, confidence);
        intent.multi_step = multi_step;
        intent.complexity = if multi_step {
            Complexity::High
        } else if short {
            Complexity::Low
        } else {
            Complexity::Medium
        };
        intent.requires_clarification = short || !multi_step;
        if multi_step {
            intent.secondary_processors.insert(ProcessorKind::Basic);
            intent.summary = Some(plan.summary.clone()).filter(|s| !s.is_empty());
            intent.task_plan = Some(plan);
        }
        intent
    }
}

#[async_trait]
impl IIntentDetector for PlannerDetector {
    fn name(&self) -> &'static str {
        "llm-planner"
    }

    async fn detect(&self, query: &str, _index: &CascadeIndex) -> RelayResult<Detection> {
        if !self.config.planner_enabled {
            return Ok(Detection::unmatched("planner disabled"));
        }
        let short = self.is_short(query);

        if let Some(hit) = self.task_planner.cached_plan(query).await {
            let intent = self
                .planned_intent(
                    TaskType::Unknown,
                    TopicDomain::Unknown,
                    hit.plan,
                    self.config.cached_plan_confidence,
                    short,
                )
                .with_attribute("planner_model", "cached")
                .with_attribute("similarity", format!("{:.4}", hit.similarity));
            let reason = format!("cached plan, similarity {:.3}", hit.similarity);
            return Ok(
                Detection::matched(CascadeDecision::ContinueCascade, intent, reason).with_cached(true),
            );
        }

        let planner = Arc::clone(&self.planner);
        let text = query.to_string();
        let classification = call_blocking("planner", self.timeouts.planner(), move || {
            planner.classify(&text)
        })
        .await?;

        let confidence = if short {
            self.config.short_query_confidence
        } else {
            self.config.planner_confidence
        };
        let mut intent = self
            .planned_intent(
                classification.task_type.unwrap_or(TaskType::Unknown),
                classification.domain.unwrap_or(TopicDomain::Unknown),
                classification.plan,
                confidence,
                short,
            )
            .with_attribute("planner_model", "llm");
        if classification.summary.is_some() {
            intent.summary = classification.summary;
        }
        if let Some(plan) = &intent.task_plan {
            self.task_planner.remember(query, plan).await;
        }

        let reason = format!(
            "classified as {} with {} tasks",
            intent.task_type.as_str(),
            intent.task_plan.as_ref().map_or(0, |p| p.tasks.len())
        );
        Ok(Detection::matched(
            CascadeDecision::ContinueCascade,
            intent,
            reason,
        ))
    }
}
