//! Normalized coordinate snapshots and the sink that receives them.

use serde::Serialize;
use thiserror::Error;

use crate::vector::Point;

/// Normalized positions for every node at one moment of a run.
///
/// A snapshot owns its data; it holds no references into the simulation
/// and can be moved to another thread freely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateSnapshot<K> {
    /// (key, position) pairs in node input order.
    pub points: Vec<(K, Point)>,
    /// Iteration that produced these positions.
    pub iteration: u64,
    /// Convergence metric at that iteration.
    pub energy: f64,
    /// Whether this is the final snapshot of the run.
    pub terminal: bool,
}

impl<K> CoordinateSnapshot<K> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Point)> {
        self.points.iter().map(|(key, point)| (key, point))
    }

    pub fn into_points(self) -> Vec<(K, Point)> {
        self.points
    }
}

impl<K: PartialEq> CoordinateSnapshot<K> {
    /// Position of a node by key.
    pub fn position(&self, key: &K) -> Option<Point> {
        self.points
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, point)| *point)
    }
}

/// Failure raised by a snapshot consumer.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SinkError {
    message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The receiving side has gone away.
    pub fn disconnected() -> Self {
        Self::new("snapshot receiver disconnected")
    }
}

/// Receives snapshots produced by a run.
///
/// Returning an error terminates the run; it is never retried.
pub trait SnapshotSink<K> {
    fn emit(&mut self, snapshot: CoordinateSnapshot<K>) -> Result<(), SinkError>;
}

impl<K, F> SnapshotSink<K> for F
where
    F: FnMut(CoordinateSnapshot<K>) -> Result<(), SinkError>,
{
    fn emit(&mut self, snapshot: CoordinateSnapshot<K>) -> Result<(), SinkError> {
        self(snapshot)
    }
}

/// Collects every snapshot in order.
impl<K> SnapshotSink<K> for Vec<CoordinateSnapshot<K>> {
    fn emit(&mut self, snapshot: CoordinateSnapshot<K>) -> Result<(), SinkError> {
        self.push(snapshot);
        Ok(())
    }
}
