//! Normalization of raw positions and throttled snapshot emission.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::config::SimulationConfig;
use crate::graph::LayoutGraph;
use crate::snapshot::{CoordinateSnapshot, SinkError, SnapshotSink};
use crate::vector::Point;

/// Axis-aligned bounding box of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Bounding box of the given points, or `None` when there are none.
    pub fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;

        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        Some(Self { min, max })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Maps raw positions onto `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaler {
    pub width: f64,
    pub height: f64,
}

impl Scaler {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Normalize each point against the bounding box of all of them.
    ///
    /// An axis with zero range maps every point to 0 on that axis.
    pub fn scale(&self, points: &[Point]) -> Vec<Point> {
        let Some(bounds) = Bounds::of(points) else {
            return Vec::new();
        };

        points
            .iter()
            .map(|p| {
                Point::new(
                    fraction(p.x, bounds.min.x, bounds.max.x) * self.width,
                    fraction(p.y, bounds.min.y, bounds.max.y) * self.height,
                )
            })
            .collect()
    }
}

/// Position of `value` within `[min, max]` as a fraction in `[0, 1]`.
///
/// Works on halved values so that the range of two large finite extents
/// cannot overflow to infinity.
fn fraction(value: f64, min: f64, max: f64) -> f64 {
    let half_range = max * 0.5 - min * 0.5;
    if half_range == 0.0 {
        return 0.0;
    }
    ((value * 0.5 - min * 0.5) / half_range).clamp(0.0, 1.0)
}

/// Smallest distance between any two points (`None` for fewer than two).
fn min_pairwise_distance(points: &[Point]) -> Option<f64> {
    let mut min: Option<f64> = None;
    for (i, p) in points.iter().enumerate() {
        for q in &points[i + 1..] {
            let d = p.distance(q);
            min = Some(min.map_or(d, |m| m.min(d)));
        }
    }
    min
}

/// Turns arena positions into snapshots and hands them to a sink.
///
/// Progress emissions are throttled by the configured interval and may be
/// withheld by the optional separation filter. Terminal emissions always go
/// through.
#[derive(Debug, Clone)]
pub struct ScalerEmitter {
    scaler: Scaler,
    interval: Duration,
    min_separation: Option<f64>,
    last_emit: Instant,
    emitted: u64,
    suppressed: u64,
}

impl ScalerEmitter {
    /// An emitter whose throttle clock starts at `started`.
    pub fn new(config: &SimulationConfig, started: Instant) -> Self {
        Self {
            scaler: Scaler::new(config.output_width, config.output_height),
            interval: config.emit_interval(),
            min_separation: config.min_output_separation,
            last_emit: started,
            emitted: 0,
            suppressed: 0,
        }
    }

    /// Whether a progress snapshot is due.
    pub fn is_due(&self, now: Instant) -> bool {
        now.duration_since(self.last_emit) >= self.interval
    }

    /// Snapshots handed to the sink so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Progress snapshots withheld by the separation filter.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Build a normalized snapshot of the graph's current positions.
    pub fn snapshot<K: Clone>(
        &self,
        graph: &LayoutGraph<K>,
        iteration: u64,
        energy: f64,
        terminal: bool,
    ) -> CoordinateSnapshot<K> {
        let scaled = self.scaler.scale(&graph.positions());
        CoordinateSnapshot {
            points: graph.keys().iter().cloned().zip(scaled).collect(),
            iteration,
            energy,
            terminal,
        }
    }

    /// Emit a progress snapshot and restart the throttle clock.
    ///
    /// Returns `false` when the separation filter withheld it.
    pub fn emit_progress<K, S>(
        &mut self,
        graph: &LayoutGraph<K>,
        iteration: u64,
        energy: f64,
        sink: &mut S,
    ) -> Result<bool, SinkError>
    where
        K: Clone,
        S: SnapshotSink<K>,
    {
        self.last_emit = Instant::now();
        let snapshot = self.snapshot(graph, iteration, energy, false);

        if let Some(threshold) = self.min_separation {
            let positions: Vec<Point> = snapshot.points.iter().map(|(_, p)| *p).collect();
            if min_pairwise_distance(&positions).is_some_and(|d| d <= threshold) {
                trace!(iteration, "progress_snapshot_suppressed");
                self.suppressed += 1;
                return Ok(false);
            }
        }

        sink.emit(snapshot)?;
        self.emitted += 1;
        Ok(true)
    }

    /// Emit the final snapshot of a run.
    pub fn emit_terminal<K, S>(
        &mut self,
        graph: &LayoutGraph<K>,
        iteration: u64,
        energy: f64,
        sink: &mut S,
    ) -> Result<(), SinkError>
    where
        K: Clone,
        S: SnapshotSink<K>,
    {
        self.last_emit = Instant::now();
        sink.emit(self.snapshot(graph, iteration, energy, true))?;
        self.emitted += 1;
        Ok(())
    }
}
