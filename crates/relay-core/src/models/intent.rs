use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::plan::TaskPlan;

/// What kind of task a query represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Faq,
    FactLookup,
    Comparison,
    Summarization,
    Analysis,
    DecisionSupport,
    Troubleshoot,
    OrderLookup,
    Weather,
    Chat,
    Unknown,
}

impl TaskType {
    pub const ALL: [TaskType; 11] = [
        Self::Faq,
        Self::FactLookup,
        Self::Comparison,
        Self::Summarization,
        Self::Analysis,
        Self::DecisionSupport,
        Self::Troubleshoot,
        Self::OrderLookup,
        Self::Weather,
        Self::Chat,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Faq => "FAQ",
            Self::FactLookup => "FACT_LOOKUP",
            Self::Comparison => "COMPARISON",
            Self::Summarization => "SUMMARIZATION",
            Self::Analysis => "ANALYSIS",
            Self::DecisionSupport => "DECISION_SUPPORT",
            Self::Troubleshoot => "TROUBLESHOOT",
            Self::OrderLookup => "ORDER_LOOKUP",
            Self::Weather => "WEATHER",
            Self::Chat => "CHAT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(label))
    }
}

/// Subject area of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicDomain {
    General,
    Product,
    Order,
    Legal,
    Finance,
    TechSupport,
    Weather,
    Unknown,
}

impl TopicDomain {
    pub const ALL: [TopicDomain; 8] = [
        Self::General,
        Self::Product,
        Self::Order,
        Self::Legal,
        Self::Finance,
        Self::TechSupport,
        Self::Weather,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Product => "PRODUCT",
            Self::Order => "ORDER",
            Self::Legal => "LEGAL",
            Self::Finance => "FINANCE",
            Self::TechSupport => "TECH_SUPPORT",
            Self::Weather => "WEATHER",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(label))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// Which detector produced an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentSource {
    RuleBased,
    SemanticRouter,
    LlmPlanner,
    Fallback,
}

/// Route selector: the closed set of query processor strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessorKind {
    Basic,
    MultiQuery,
    Hyde,
    Decomposition,
    StepBack,
    SelfRag,
    RagFusion,
    RetrievalAware,
}

impl ProcessorKind {
    pub const ALL: [ProcessorKind; 8] = [
        Self::Basic,
        Self::MultiQuery,
        Self::Hyde,
        Self::Decomposition,
        Self::StepBack,
        Self::SelfRag,
        Self::RagFusion,
        Self::RetrievalAware,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::MultiQuery => "MULTI_QUERY",
            Self::Hyde => "HYDE",
            Self::Decomposition => "DECOMPOSITION",
            Self::StepBack => "STEP_BACK",
            Self::SelfRag => "SELF_RAG",
            Self::RagFusion => "RAG_FUSION",
            Self::RetrievalAware => "RETRIEVAL_AWARE",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(label))
    }
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classification produced by the intent cascade for one query.
/// Built once per query and not modified after the cascade completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub source: IntentSource,
    pub task_type: TaskType,
    pub domain: TopicDomain,
    pub complexity: Complexity,
    pub multi_step: bool,
    pub requires_clarification: bool,
    pub lock_processor: bool,
    pub allow_cascade: bool,
    pub recommended_processor: ProcessorKind,
    pub secondary_processors: BTreeSet<ProcessorKind>,
    pub confidence: f64,
    pub task_plan: Option<TaskPlan>,
    pub summary: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl QueryIntent {
    /// A single-step intent with neutral flags.
    pub fn new(
        source: IntentSource,
        task_type: TaskType,
        domain: TopicDomain,
        recommended_processor: ProcessorKind,
        confidence: f64,
    ) -> Self {
        Self {
            source,
            task_type,
            domain,
            complexity: Complexity::Medium,
            multi_step: false,
            requires_clarification: false,
            lock_processor: false,
            allow_cascade: true,
            recommended_processor,
            secondary_processors: BTreeSet::new(),
            confidence,
            task_plan: None,
            summary: None,
            attributes: BTreeMap::new(),
        }
    }

    /// The intent used when no detector produced a candidate.
    pub fn fallback(query_text: &str, confidence: f64, long_query_chars: usize) -> Self {
        let complexity = if query_text.chars().count() > long_query_chars {
            Complexity::High
        } else {
            Complexity::Medium
        };
        Self {
            complexity,
            requires_clarification: true,
            allow_cascade: false,
            summary: Some("intent not recognised; ask the user to clarify".to_string()),
            ..Self::new(
                IntentSource::Fallback,
                TaskType::Unknown,
                TopicDomain::Unknown,
                ProcessorKind::Basic,
                confidence,
            )
        }
    }

    pub fn with_plan(mut self, plan: TaskPlan) -> Self {
        self.task_plan = Some(plan);
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Whether a plan with at least one task is attached.
    pub fn has_plan(&self) -> bool {
        self.task_plan.as_ref().is_some_and(TaskPlan::has_tasks)
    }
}
