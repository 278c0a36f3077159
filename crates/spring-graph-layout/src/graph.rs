//! Node-state arena and its construction from opaque host objects.
//!
//! All node states live in one contiguous vector. Adjacency lists hold
//! [`NodeIndex`] handles into that vector, so cyclic graphs need no shared
//! ownership.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::adapter::{GraphAdapter, NodeKey};
use crate::error::{LayoutError, LayoutResult};
use crate::vector::{Point, Vector2};

/// Handle to a node state within one [`LayoutGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Simulation record for one node.
#[derive(Debug, Clone)]
pub struct NodeState {
    pub position: Point,
    pub velocity: Vector2,
    /// Approximate topological depth, only meaningful during pre-solve.
    pub sort_score: f64,
    /// Nodes with an edge pointing into this node.
    pub inputs: Vec<NodeIndex>,
    /// Nodes this node points to.
    pub nexts: Vec<NodeIndex>,
}

impl NodeState {
    fn new() -> Self {
        Self {
            position: Point::default(),
            velocity: Vector2::ZERO,
            sort_score: 1.0,
            inputs: Vec::new(),
            nexts: Vec::new(),
        }
    }
}

/// The arena of node states for one run, in node input order.
#[derive(Debug, Clone)]
pub struct LayoutGraph<K> {
    keys: Vec<K>,
    nodes: Vec<NodeState>,
}

impl<K> LayoutGraph<K> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn key(&self, index: NodeIndex) -> &K {
        &self.keys[index.0]
    }

    pub fn nodes(&self) -> &[NodeState] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [NodeState] {
        &mut self.nodes
    }

    pub fn node(&self, index: NodeIndex) -> &NodeState {
        &self.nodes[index.0]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut NodeState {
        &mut self.nodes[index.0]
    }

    /// Current raw positions in arena order.
    pub fn positions(&self) -> Vec<Point> {
        self.nodes.iter().map(|n| n.position).collect()
    }

    /// Number of directed adjacencies recorded.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.nexts.len()).sum()
    }
}

impl<K: NodeKey> LayoutGraph<K> {
    /// Look up a node's index by key (linear scan; the build-time map is
    /// not retained).
    pub fn index_of(&self, key: &K) -> Option<NodeIndex> {
        self.keys.iter().position(|k| k == key).map(NodeIndex)
    }
}

/// Counters describing what the builder kept and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub nodes: usize,
    pub edges_accepted: usize,
    pub dangling_edges: usize,
    pub self_loops: usize,
}

/// Builds a [`LayoutGraph`] from host nodes and edges through an adapter.
pub struct GraphBuilder<'a, A> {
    adapter: &'a A,
}

impl<'a, A> GraphBuilder<'a, A> {
    pub fn new(adapter: &'a A) -> Self {
        Self { adapter }
    }

    /// Build the arena, discarding the report.
    pub fn build<N, E>(&self, nodes: &[N], edges: &[E]) -> LayoutResult<LayoutGraph<A::Key>>
    where
        A: GraphAdapter<N, E>,
    {
        self.build_with_report(nodes, edges).map(|(graph, _)| graph)
    }

    /// Build the arena and report what was kept.
    ///
    /// Fails on a duplicate node key or an adapter error. Edges with a
    /// missing or unknown endpoint, and self-loops, are dropped.
    pub fn build_with_report<N, E>(
        &self,
        nodes: &[N],
        edges: &[E],
    ) -> LayoutResult<(LayoutGraph<A::Key>, BuildReport)>
    where
        A: GraphAdapter<N, E>,
    {
        let mut index_by_key: HashMap<A::Key, NodeIndex> = HashMap::with_capacity(nodes.len());
        let mut keys = Vec::with_capacity(nodes.len());
        let mut states = Vec::with_capacity(nodes.len());

        for node in nodes {
            let key = self.adapter.key_of(node)?;
            if index_by_key.contains_key(&key) {
                return Err(LayoutError::DuplicateKey {
                    key: format!("{:?}", key),
                });
            }
            index_by_key.insert(key.clone(), NodeIndex(keys.len()));
            keys.push(key);
            states.push(NodeState::new());
        }

        let mut report = BuildReport {
            nodes: keys.len(),
            ..Default::default()
        };

        for edge in edges {
            let source = self.adapter.source_key_of(edge)?;
            let destination = self.adapter.destination_key_of(edge)?;

            let resolved = match (source, destination) {
                (Some(s), Some(d)) => index_by_key
                    .get(&s)
                    .copied()
                    .zip(index_by_key.get(&d).copied()),
                _ => None,
            };

            let Some((source, destination)) = resolved else {
                trace!("dangling_edge_dropped");
                report.dangling_edges += 1;
                continue;
            };

            if source == destination {
                trace!(node = source.0, "self_loop_dropped");
                report.self_loops += 1;
                continue;
            }

            states[source.0].nexts.push(destination);
            states[destination.0].inputs.push(source);
            report.edges_accepted += 1;
        }

        debug!(
            nodes = report.nodes,
            edges = report.edges_accepted,
            dangling = report.dangling_edges,
            self_loops = report.self_loops,
            "layout_graph_built"
        );

        Ok((
            LayoutGraph {
                keys,
                nodes: states,
            },
            report,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterError, FnAdapter};

    type Edge = (Option<&'static str>, Option<&'static str>);

    fn adapter() -> FnAdapter<
        impl Fn(&&'static str) -> String,
        impl Fn(&Edge) -> Option<String>,
        impl Fn(&Edge) -> Option<String>,
    > {
        FnAdapter::new(
            |n: &&'static str| n.to_string(),
            |e: &Edge| e.0.map(str::to_string),
            |e: &Edge| e.1.map(str::to_string),
        )
    }

    #[test]
    fn test_builds_directed_adjacency() {
        let adapter = adapter();
        let nodes = ["a", "b", "c"];
        let edges: [Edge; 2] = [(Some("a"), Some("b")), (Some("b"), Some("c"))];

        let graph = GraphBuilder::new(&adapter).build(&nodes, &edges).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.keys(), &["a", "b", "c"]);
        assert_eq!(graph.node(NodeIndex(0)).nexts, vec![NodeIndex(1)]);
        assert_eq!(graph.node(NodeIndex(1)).inputs, vec![NodeIndex(0)]);
        assert_eq!(graph.node(NodeIndex(1)).nexts, vec![NodeIndex(2)]);
        assert_eq!(graph.node(NodeIndex(2)).inputs, vec![NodeIndex(1)]);
        assert!(graph.node(NodeIndex(0)).inputs.is_empty());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_duplicate_key_fails() {
        let adapter = adapter();
        let nodes = ["a", "b", "a"];
        let edges: [Edge; 0] = [];

        let err = GraphBuilder::new(&adapter).build(&nodes, &edges).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateKey { ref key } if key == "\"a\""));
    }

    #[test]
    fn test_drops_dangling_and_self_loops() {
        let adapter = adapter();
        let nodes = ["a", "b"];
        let edges: [Edge; 5] = [
            (Some("a"), Some("zzz")),
            (None, Some("b")),
            (Some("a"), None),
            (Some("b"), Some("b")),
            (Some("a"), Some("b")),
        ];

        let (graph, report) = GraphBuilder::new(&adapter)
            .build_with_report(&nodes, &edges)
            .unwrap();

        assert_eq!(report.dangling_edges, 3);
        assert_eq!(report.self_loops, 1);
        assert_eq!(report.edges_accepted, 1);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.node(NodeIndex(1)).nexts.is_empty());
    }

    #[test]
    fn test_parallel_edges_are_kept() {
        let adapter = adapter();
        let nodes = ["a", "b"];
        let edges: [Edge; 2] = [(Some("a"), Some("b")), (Some("a"), Some("b"))];

        let graph = GraphBuilder::new(&adapter).build(&nodes, &edges).unwrap();
        assert_eq!(graph.node(NodeIndex(1)).inputs.len(), 2);
    }

    struct FailingAdapter;

    impl GraphAdapter<u32, (u32, u32)> for FailingAdapter {
        type Key = u32;

        fn key_of(&self, node: &u32) -> Result<u32, AdapterError> {
            if *node == 13 {
                Err(AdapterError::new("unlucky node"))
            } else {
                Ok(*node)
            }
        }

        fn source_key_of(&self, edge: &(u32, u32)) -> Result<Option<u32>, AdapterError> {
            Ok(Some(edge.0))
        }

        fn destination_key_of(&self, edge: &(u32, u32)) -> Result<Option<u32>, AdapterError> {
            Ok(Some(edge.1))
        }
    }

    #[test]
    fn test_adapter_failure_aborts_build() {
        let err = GraphBuilder::new(&FailingAdapter)
            .build(&[1u32, 13, 2], &[(1u32, 2u32)])
            .unwrap_err();
        assert!(matches!(err, LayoutError::Adapter(_)));
        assert_eq!(err.to_string(), "key extraction failed: unlucky node");
    }

    #[test]
    fn test_index_of() {
        let edges: [(u32, u32); 0] = [];
        let graph = GraphBuilder::new(&FailingAdapter)
            .build(&[7u32, 8], &edges)
            .unwrap();
        assert_eq!(graph.index_of(&8), Some(NodeIndex(1)));
        assert_eq!(graph.index_of(&9), None);
    }
}
