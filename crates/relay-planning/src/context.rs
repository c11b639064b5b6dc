//! Per-execution state for running a task plan.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use relay_core::models::TaskNode;

/// Owned by one plan execution and passed by `&mut` through its steps.
/// Never shared across queries.
#[derive(Debug, Clone, Default)]
pub struct TaskExecutionContext {
    scratch: BTreeMap<String, String>,
    tool_attempts: HashMap<String, u32>,
    last_response: Option<String>,
    completed: BTreeSet<u32>,
}

impl TaskExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.scratch.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.scratch.get(key).map(String::as_str)
    }

    pub fn scratch(&self) -> &BTreeMap<String, String> {
        &self.scratch
    }

    /// Count one more attempt for `tool`, returning the new total.
    pub fn record_attempt(&mut self, tool: &str) -> u32 {
        let n = self.tool_attempts.entry(tool.to_string()).or_insert(0);
        *n += 1;
        *n
    }

    pub fn attempts(&self, tool: &str) -> u32 {
        self.tool_attempts.get(tool).copied().unwrap_or(0)
    }

    pub fn set_last_response(&mut self, response: impl Into<String>) {
        self.last_response = Some(response.into());
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn mark_completed(&mut self, step: u32) {
        self.completed.insert(step);
    }

    pub fn is_completed(&self, step: u32) -> bool {
        self.completed.contains(&step)
    }

    /// All of `task`'s dependencies have completed.
    pub fn is_ready(&self, task: &TaskNode) -> bool {
        task.dependencies.iter().all(|d| self.completed.contains(d))
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = u32> + '_ {
        self.completed.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_follows_completed_dependencies() {
        let mut ctx = TaskExecutionContext::new();
        let task = TaskNode::new(3, "merge", vec![1, 2]);
        assert!(!ctx.is_ready(&task));
        ctx.mark_completed(1);
        assert!(!ctx.is_ready(&task));
        ctx.mark_completed(2);
        assert!(ctx.is_ready(&task));
    }

    #[test]
    fn attempts_are_counted_per_tool() {
        let mut ctx = TaskExecutionContext::new();
        assert_eq!(ctx.record_attempt("AUTO"), 1);
        assert_eq!(ctx.record_attempt("AUTO"), 2);
        assert_eq!(ctx.record_attempt("search"), 1);
        assert_eq!(ctx.attempts("AUTO"), 2);
        assert_eq!(ctx.attempts("missing"), 0);
    }

    #[test]
    fn scratch_and_last_response() {
        let mut ctx = TaskExecutionContext::new();
        ctx.put("step.1", "three sources");
        ctx.set_last_response("first");
        ctx.set_last_response("second");
        assert_eq!(ctx.get("step.1"), Some("three sources"));
        assert_eq!(ctx.last_response(), Some("second"));
    }
}
