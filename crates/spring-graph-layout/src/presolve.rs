//! Initial placement by approximate topological depth.
//!
//! Every node starts with a sort score of 1. Each node then acts as a root
//! and walks forward along its `nexts`; every edge crossed adds 1 to the
//! score of the node it points at. The visited set is local to one root's
//! walk, so a cycle stops the walk but a node is still counted once per
//! distinct root that reaches it. This is worse than linear on dense graphs,
//! which is acceptable for diagram-sized inputs.
//!
//! Nodes are then stably sorted by score and laid out as a ribbon: nodes
//! sharing a score stack downward in a wrapping band with a small x step,
//! and a change of score moves right by a larger step.

use tracing::debug;

use crate::graph::{LayoutGraph, NodeIndex};

/// Small x step between nodes of equal score.
const X_STEP_SMALL: f64 = 5.0;
/// Large x step when the score changes.
const X_STEP: f64 = 15.0;
/// Y step between nodes of equal score.
const Y_STEP: f64 = 9.0;
/// Height of the band the y step wraps within.
const MAX_Y: f64 = 100.0;

/// Assigns non-coincident starting positions.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreSolver;

impl PreSolver {
    pub fn new() -> Self {
        Self
    }

    /// Score and place every node of the graph.
    pub fn solve<K>(&self, graph: &mut LayoutGraph<K>) {
        self.score(graph);
        let order = self.sorted_order(graph);
        self.place(graph, &order);

        debug!(nodes = graph.len(), "presolve_complete");
    }

    /// Compute sort scores only.
    pub fn score<K>(&self, graph: &mut LayoutGraph<K>) {
        let nodes = graph.nodes_mut();
        for node in nodes.iter_mut() {
            node.sort_score = 1.0;
        }

        let mut visited = vec![false; nodes.len()];
        let mut stack: Vec<usize> = Vec::new();

        for root in 0..nodes.len() {
            visited.iter_mut().for_each(|v| *v = false);
            visited[root] = true;
            stack.push(root);

            while let Some(current) = stack.pop() {
                for i in 0..nodes[current].nexts.len() {
                    let NodeIndex(next) = nodes[current].nexts[i];
                    nodes[next].sort_score += 1.0;
                    if !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }
        }
    }

    /// Node indices stably sorted by ascending sort score.
    fn sorted_order<K>(&self, graph: &LayoutGraph<K>) -> Vec<usize> {
        let nodes = graph.nodes();
        let mut order: Vec<usize> = (0..nodes.len()).collect();
        order.sort_by(|&a, &b| nodes[a].sort_score.total_cmp(&nodes[b].sort_score));
        order
    }

    fn place<K>(&self, graph: &mut LayoutGraph<K>, order: &[usize]) {
        let nodes = graph.nodes_mut();

        let mut x = X_STEP_SMALL;
        let mut y = 0.0;
        let mut last_score = 1.0;

        for &i in order {
            let node = &mut nodes[i];
            if node.sort_score == last_score {
                y = (y + Y_STEP) % MAX_Y;
                x += X_STEP_SMALL;
            } else {
                x += X_STEP;
                if y > Y_STEP {
                    y -= Y_STEP;
                }
                last_score = node.sort_score;
            }

            node.position.x = x;
            node.position.y = y;
        }
    }
}
