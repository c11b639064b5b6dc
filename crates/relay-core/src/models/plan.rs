use serde::{Deserialize, Serialize};

use super::intent::{TaskType, TopicDomain};

/// Tool name for steps whose tool is chosen at execution time.
pub const AUTO_TOOL: &str = "AUTO";

/// One step of a task plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub step: u32,
    #[serde(default = "auto_tool")]
    pub tool_name: String,
    pub description: String,
    /// Steps that must complete before this one may start.
    #[serde(default)]
    pub dependencies: Vec<u32>,
}

fn auto_tool() -> String {
    AUTO_TOOL.to_string()
}

impl TaskNode {
    pub fn new(step: u32, description: impl Into<String>, dependencies: Vec<u32>) -> Self {
        Self {
            step,
            tool_name: auto_tool(),
            description: description.into(),
            dependencies,
        }
    }
}

/// A dependency-ordered set of sub-tasks. Must form a DAG.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPlan {
    #[serde(default)]
    pub tasks: Vec<TaskNode>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub requires_tools: bool,
}

impl TaskPlan {
    pub fn new(summary: impl Into<String>, tasks: Vec<TaskNode>) -> Self {
        let requires_tools = tasks.len() > 1;
        Self {
            tasks,
            summary: summary.into(),
            requires_tools,
        }
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn step(&self, step: u32) -> Option<&TaskNode> {
        self.tasks.iter().find(|t| t.step == step)
    }
}

/// Structured classification returned by the language-model planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerClassification {
    pub task_type: Option<TaskType>,
    pub domain: Option<TopicDomain>,
    pub summary: Option<String>,
    #[serde(default)]
    pub plan: TaskPlan,
}
