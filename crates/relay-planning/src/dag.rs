//! Plan DAG validation and dependency-ordered execution waves.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use relay_core::errors::PlanningError;
use relay_core::models::TaskPlan;

/// Build the dependency graph: an edge `dep -> step` per dependency.
fn build_graph(plan: &TaskPlan) -> Result<(DiGraph<u32, ()>, HashMap<u32, NodeIndex>), PlanningError> {
    let mut graph = DiGraph::new();
    let mut nodes: HashMap<u32, NodeIndex> = HashMap::with_capacity(plan.tasks.len());
    for task in &plan.tasks {
        if nodes.contains_key(&task.step) {
            return Err(PlanningError::DuplicateStep { step: task.step });
        }
        nodes.insert(task.step, graph.add_node(task.step));
    }
    for task in &plan.tasks {
        let to = nodes[&task.step];
        for dep in &task.dependencies {
            let from = nodes
                .get(dep)
                .copied()
                .ok_or(PlanningError::UnknownDependency {
                    step: task.step,
                    dependency: *dep,
                })?;
            graph.update_edge(from, to, ());
        }
    }
    Ok((graph, nodes))
}

/// Check that step numbers are unique, every dependency exists, and the
/// dependencies form no cycle.
pub fn validate_plan(plan: &TaskPlan) -> Result<(), PlanningError> {
    let (graph, _) = build_graph(plan)?;
    for task in &plan.tasks {
        if task.dependencies.contains(&task.step) {
            return Err(PlanningError::CyclicPlan {
                steps: vec![task.step],
            });
        }
    }
    if let Some(scc) = tarjan_scc(&graph).into_iter().find(|scc| scc.len() > 1) {
        let mut steps: Vec<u32> = scc.iter().map(|n| graph[*n]).collect();
        steps.sort_unstable();
        return Err(PlanningError::CyclicPlan { steps });
    }
    Ok(())
}

/// Group steps into waves: every step's dependencies sit in earlier waves.
/// Steps within a wave are independent and sorted ascending.
pub fn execution_waves(plan: &TaskPlan) -> Result<Vec<Vec<u32>>, PlanningError> {
    validate_plan(plan)?;
    let (graph, nodes) = build_graph(plan)?;

    let mut indegree: HashMap<NodeIndex, usize> = nodes
        .values()
        .map(|n| (*n, graph.neighbors_directed(*n, Direction::Incoming).count()))
        .collect();
    let mut ready: Vec<NodeIndex> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(n, _)| *n)
        .collect();

    let mut waves = Vec::new();
    while !ready.is_empty() {
        let mut wave: Vec<u32> = ready.iter().map(|n| graph[*n]).collect();
        wave.sort_unstable();

        let mut next = Vec::new();
        for node in ready {
            for succ in graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(d) = indegree.get_mut(&succ) {
                    *d -= 1;
                    if *d == 0 {
                        next.push(succ);
                    }
                }
            }
        }
        waves.push(wave);
        ready = next;
    }
    Ok(waves)
}
