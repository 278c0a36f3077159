//! Handles to an in-flight layout run.

use spring_graph_layout::{CoordinateSnapshot, LayoutResult, RunSummary, StopReason};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::EngineError;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Converged, hit a limit, or diverged; the terminal snapshot was
    /// delivered.
    Completed(RunSummary),
    /// Stopped by the cancellation token, or by dropping the run. No
    /// terminal snapshot.
    Cancelled,
    /// Build, sink, or worker failure.
    Failed(EngineError),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            Self::Completed(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Cancellation and completion for one run, without the snapshot stream.
///
/// Dropping the handle cancels the run.
#[derive(Debug)]
pub struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<LayoutResult<RunSummary>>,
    _cancel_on_drop: DropGuard,
}

impl RunHandle {
    pub(crate) fn new(cancel: CancellationToken, task: JoinHandle<LayoutResult<RunSummary>>) -> Self {
        Self {
            _cancel_on_drop: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    /// Ask the worker to stop at the start of its next iteration.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the run's token, for wiring into other shutdown paths.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the worker and classify how it ended.
    pub async fn outcome(self) -> RunOutcome {
        match self.task.await {
            Ok(Ok(summary)) if summary.stop_reason == StopReason::Cancelled => RunOutcome::Cancelled,
            Ok(Ok(summary)) => RunOutcome::Completed(summary),
            Ok(Err(err)) => RunOutcome::Failed(EngineError::Layout(err)),
            Err(err) => RunOutcome::Failed(EngineError::Worker(err.to_string())),
        }
    }
}

/// Everything a drained run produced.
#[derive(Debug)]
pub struct RunReport<K> {
    pub outcome: RunOutcome,
    /// The last snapshot received, terminal when the run completed.
    pub last_snapshot: Option<CoordinateSnapshot<K>>,
}

/// A background run with its snapshot stream.
///
/// Dropping the run cancels it.
#[derive(Debug)]
pub struct LayoutRun<K> {
    handle: RunHandle,
    snapshots: mpsc::Receiver<CoordinateSnapshot<K>>,
}

impl<K> LayoutRun<K> {
    pub(crate) fn new(handle: RunHandle, snapshots: mpsc::Receiver<CoordinateSnapshot<K>>) -> Self {
        Self { handle, snapshots }
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.handle.cancellation_token()
    }

    /// Next snapshot, or `None` once the worker has finished sending.
    pub async fn next_snapshot(&mut self) -> Option<CoordinateSnapshot<K>> {
        self.snapshots.recv().await
    }

    /// Split into the raw receiver and the completion handle.
    ///
    /// Dropping the receiver before the run ends makes the terminal
    /// snapshot undeliverable and the run reports `Failed`.
    pub fn into_parts(self) -> (mpsc::Receiver<CoordinateSnapshot<K>>, RunHandle) {
        (self.snapshots, self.handle)
    }

    /// Drain the stream to its end, then wait for the worker.
    pub async fn finish(mut self) -> RunReport<K> {
        let mut last_snapshot = None;
        while let Some(snapshot) = self.snapshots.recv().await {
            last_snapshot = Some(snapshot);
        }

        RunReport {
            outcome: self.handle.outcome().await,
            last_snapshot,
        }
    }

    /// Drain and wait, keeping only the outcome.
    pub async fn outcome(self) -> RunOutcome {
        self.finish().await.outcome
    }
}
