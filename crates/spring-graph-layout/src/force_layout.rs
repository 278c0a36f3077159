//! One-call entry point tying the pipeline together.

use tracing::{debug, info_span};

use crate::adapter::GraphAdapter;
use crate::config::SimulationConfig;
use crate::error::LayoutResult;
use crate::graph::GraphBuilder;
use crate::integrator::{CancelSignal, Integrator, RunSummary};
use crate::presolve::PreSolver;
use crate::snapshot::SnapshotSink;

/// An adapter paired with a configuration.
///
/// `layout` is synchronous and runs on the calling thread. Each call builds
/// a fresh arena, so one `ForceLayout` can lay out many graphs.
#[derive(Debug, Clone)]
pub struct ForceLayout<A> {
    adapter: A,
    config: SimulationConfig,
}

impl<A> ForceLayout<A> {
    pub fn new(adapter: A, config: SimulationConfig) -> Self {
        Self { adapter, config }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Validate, build, pre-solve, then integrate until termination.
    pub fn layout<N, E, S, C>(
        &self,
        nodes: &[N],
        edges: &[E],
        sink: &mut S,
        cancel: &C,
    ) -> LayoutResult<RunSummary>
    where
        A: GraphAdapter<N, E>,
        S: SnapshotSink<A::Key>,
        C: CancelSignal + ?Sized,
    {
        let span = info_span!("force_layout", nodes = nodes.len(), edges = edges.len());
        let _enter = span.enter();

        self.config.validate()?;

        let (mut graph, report) = GraphBuilder::new(&self.adapter).build_with_report(nodes, edges)?;
        if report.dangling_edges > 0 || report.self_loops > 0 {
            debug!(
                dangling = report.dangling_edges,
                self_loops = report.self_loops,
                "edges_ignored"
            );
        }

        PreSolver::new().solve(&mut graph);

        Integrator::new(graph, self.config.clone()).run(sink, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::FnAdapter;
    use crate::error::LayoutError;
    use crate::integrator::{NeverCancel, StopReason};
    use crate::snapshot::CoordinateSnapshot;

    fn adapter() -> FnAdapter<
        impl Fn(&u32) -> u32,
        impl Fn(&(u32, u32)) -> Option<u32>,
        impl Fn(&(u32, u32)) -> Option<u32>,
    > {
        FnAdapter::new(
            |n: &u32| *n,
            |e: &(u32, u32)| Some(e.0),
            |e: &(u32, u32)| Some(e.1),
        )
    }

    #[test]
    fn test_invalid_config_rejected_before_build() {
        let layout = ForceLayout::new(
            adapter(),
            SimulationConfig {
                damping: 0.0,
                ..Default::default()
            },
        );
        let mut snapshots: Vec<CoordinateSnapshot<u32>> = Vec::new();

        let err = layout
            .layout(&[1u32, 1], &[(1u32, 1u32)], &mut snapshots, &NeverCancel)
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidConfig { .. }));
        assert!(snapshots.is_empty());
    }

    #[test]
    fn test_empty_graph_emits_empty_terminal_snapshot() {
        let layout = ForceLayout::new(adapter(), SimulationConfig::default());
        let mut snapshots: Vec<CoordinateSnapshot<u32>> = Vec::new();
        let nodes: [u32; 0] = [];
        let edges: [(u32, u32); 0] = [];

        let summary = layout
            .layout(&nodes, &edges, &mut snapshots, &NeverCancel)
            .unwrap();

        assert_eq!(summary.stop_reason, StopReason::Converged);
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].is_empty());
        assert!(snapshots[0].is_terminal());
    }

    #[test]
    fn test_layout_is_reusable() {
        let layout = ForceLayout::new(adapter(), SimulationConfig::fast());

        for n in 1..4u32 {
            let nodes: Vec<u32> = (0..n).collect();
            let edges: Vec<(u32, u32)> = (1..n).map(|i| (i - 1, i)).collect();
            let mut snapshots: Vec<CoordinateSnapshot<u32>> = Vec::new();

            layout
                .layout(&nodes, &edges, &mut snapshots, &NeverCancel)
                .unwrap();
            assert_eq!(snapshots.last().unwrap().len(), n as usize);
        }
    }
}
