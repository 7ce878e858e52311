//! Execution Scheduler
//!
//! Computes the order in which nodes run. Uses Kahn's algorithm with a
//! strict FIFO ready queue: among nodes that become ready together, the one
//! declared first runs first, so the same graph always yields the same plan.

use std::collections::VecDeque;

use log::debug;
use thiserror::Error;

use super::graph::Graph;

/// Failure to produce a complete execution order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    /// Some nodes could never become ready. This covers both directed cycles
    /// and nodes that only hang off a cycle; the two are not distinguished.
    #[error(
        "Workflow contains cycles or disconnected nodes ({} of {total} nodes could not be scheduled: {})",
        .unscheduled.len(),
        .unscheduled.join(", ")
    )]
    CyclicGraph {
        total: usize,
        unscheduled: Vec<String>,
    },
}

/// Returns node ids in a dependency-respecting order.
///
/// Every connection's source precedes its target in the result. Fails with
/// [`SchedulingError::CyclicGraph`] when not every node can be placed; no
/// partial order is returned in that case.
pub fn order(graph: &Graph<'_>) -> Result<Vec<String>, SchedulingError> {
    let mut in_degree: Vec<usize> = (0..graph.len()).map(|i| graph.in_degree(i)).collect();

    let mut queue: VecDeque<usize> = (0..graph.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut sorted: Vec<usize> = Vec::with_capacity(graph.len());

    while let Some(current) = queue.pop_front() {
        sorted.push(current);

        for &successor in graph.successors(current) {
            in_degree[successor] -= 1;
            if in_degree[successor] == 0 {
                queue.push_back(successor);
            }
        }
    }

    if sorted.len() != graph.len() {
        let unscheduled = graph
            .nodes()
            .iter()
            .enumerate()
            .filter(|(i, _)| in_degree[*i] > 0)
            .map(|(_, node)| node.id.clone())
            .collect();

        return Err(SchedulingError::CyclicGraph {
            total: graph.len(),
            unscheduled,
        });
    }

    let plan: Vec<String> = sorted
        .into_iter()
        .map(|i| graph.node(i).id.clone())
        .collect();

    debug!("Execution order: {:?}", plan);
    Ok(plan)
}
