//! Background runner for spring-graph layouts.
//!
//! [`LayoutEngine`] moves one layout onto a blocking worker thread and hands
//! back a [`LayoutRun`] that streams normalized snapshots over a bounded
//! channel, can be cancelled, and reports a [`RunOutcome`] when done. An
//! engine runs one layout at a time.
//!
//! ```no_run
//! use spring_graph_engine::LayoutEngine;
//! use spring_graph_layout::{FnAdapter, SimulationConfig};
//!
//! # async fn demo() -> Result<(), spring_graph_engine::EngineError> {
//! let adapter = FnAdapter::new(
//!     |n: &String| n.clone(),
//!     |e: &(String, String)| Some(e.0.clone()),
//!     |e: &(String, String)| Some(e.1.clone()),
//! );
//! let engine = LayoutEngine::new(adapter, SimulationConfig::fast());
//!
//! let nodes = vec!["a".to_string(), "b".to_string()];
//! let edges = vec![("a".to_string(), "b".to_string())];
//! let mut run = engine.start(nodes, edges)?;
//! while let Some(snapshot) = run.next_snapshot().await {
//!     println!("{} points at iteration {}", snapshot.len(), snapshot.iteration);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod run;
mod sink;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use spring_graph_layout::{
    CoordinateSnapshot, ForceLayout, GraphAdapter, SimulationConfig, SnapshotSink,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use error::{EngineError, EngineResult};
pub use run::{LayoutRun, RunHandle, RunOutcome, RunReport};

use sink::ChannelSink;

/// Default capacity of the snapshot channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Marks an engine busy for as long as it lives.
struct RunGuard {
    active: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(active: &Arc<AtomicBool>) -> EngineResult<Self> {
        active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::RunInProgress)?;
        Ok(Self {
            active: Arc::clone(active),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Runs layouts for one adapter and configuration in the background.
pub struct LayoutEngine<A> {
    layout: Arc<ForceLayout<A>>,
    channel_capacity: usize,
    active: Arc<AtomicBool>,
}

impl<A> LayoutEngine<A> {
    pub fn new(adapter: A, config: SimulationConfig) -> Self {
        Self {
            layout: Arc::new(ForceLayout::new(adapter, config)),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bound on buffered snapshots (at least 1).
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        self.layout.config()
    }

    /// Whether a run is currently active.
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Start a run that streams snapshots over a channel.
    pub fn start<N, E>(&self, nodes: Vec<N>, edges: Vec<E>) -> EngineResult<LayoutRun<A::Key>>
    where
        A: GraphAdapter<N, E> + Send + Sync + 'static,
        A::Key: Send + 'static,
        N: Send + 'static,
        E: Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let handle = self.spawn(nodes, edges, ChannelSink::new(tx))?;
        Ok(LayoutRun::new(handle, rx))
    }

    /// Start a run that hands snapshots to `sink` on the worker thread.
    ///
    /// The sink is called synchronously between iterations, so a slow sink
    /// slows the simulation down. Use [`start`](Self::start) to decouple
    /// the consumer through the bounded channel instead.
    pub fn start_with_sink<N, E, S>(
        &self,
        nodes: Vec<N>,
        edges: Vec<E>,
        sink: S,
    ) -> EngineResult<RunHandle>
    where
        A: GraphAdapter<N, E> + Send + Sync + 'static,
        N: Send + 'static,
        E: Send + 'static,
        S: SnapshotSink<A::Key> + Send + 'static,
    {
        self.spawn(nodes, edges, sink)
    }

    /// Run to the end and return the final snapshot.
    pub async fn run_to_completion<N, E>(
        &self,
        nodes: Vec<N>,
        edges: Vec<E>,
    ) -> EngineResult<CoordinateSnapshot<A::Key>>
    where
        A: GraphAdapter<N, E> + Send + Sync + 'static,
        A::Key: Send + 'static,
        N: Send + 'static,
        E: Send + 'static,
    {
        let report = self.start(nodes, edges)?.finish().await;
        match report.outcome {
            RunOutcome::Completed(_) => report.last_snapshot.ok_or(EngineError::NoSnapshot),
            RunOutcome::Cancelled => Err(EngineError::Cancelled),
            RunOutcome::Failed(err) => Err(err),
        }
    }

    fn spawn<N, E, S>(&self, nodes: Vec<N>, edges: Vec<E>, mut sink: S) -> EngineResult<RunHandle>
    where
        A: GraphAdapter<N, E> + Send + Sync + 'static,
        N: Send + 'static,
        E: Send + 'static,
        S: SnapshotSink<A::Key> + Send + 'static,
    {
        let guard = RunGuard::acquire(&self.active)?;
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let layout = Arc::clone(&self.layout);

        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            "layout_task_spawned"
        );

        let task = runtime.spawn_blocking(move || {
            let result = layout.layout(&nodes, &edges, &mut sink, &|| token.is_cancelled());
            drop(guard);

            match &result {
                Ok(summary) => info!(
                    iterations = summary.iterations,
                    reason = ?summary.stop_reason,
                    "layout_task_finished"
                ),
                Err(err) => warn!(error = %err, "layout_task_failed"),
            }
            result
        });

        Ok(RunHandle::new(cancel, task))
    }
}

impl<A> std::fmt::Debug for LayoutEngine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("config", self.layout.config())
            .field("channel_capacity", &self.channel_capacity)
            .field("running", &self.is_running())
            .finish()
    }
}
