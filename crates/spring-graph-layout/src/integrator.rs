//! The physics loop.
//!
//! Each iteration accumulates, for every node, an inverse-distance repulsion
//! from every other node and a capped spring force from every node in its
//! `inputs`. Velocity is integrated with a unit time step, damped, and
//! added to the position. Nodes are updated in arena order and in place, so
//! later nodes see the already-moved positions of earlier ones.
//!
//! ```text
//!   Running ──(converged | iteration limit | time limit | diverged | cancelled)──▶ Terminated
//! ```
//!
//! A tick that produces a non-finite position or metric is rolled back to
//! the positions before it and ends the run as [`StopReason::Diverged`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::error::LayoutResult;
use crate::graph::LayoutGraph;
use crate::scaler::ScalerEmitter;
use crate::snapshot::SnapshotSink;
use crate::vector::{Point, Vector2};

/// Polled once per iteration to stop a run early.
pub trait CancelSignal {
    fn is_cancelled(&self) -> bool;
}

impl<F: Fn() -> bool> CancelSignal for F {
    fn is_cancelled(&self) -> bool {
        self()
    }
}

impl CancelSignal for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// A signal that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Energy fell below the threshold.
    Converged,
    /// The iteration ceiling was reached.
    IterationLimit,
    /// The wall-clock budget ran out.
    TimeLimit,
    /// A tick overflowed; positions are those of the last finite tick.
    Diverged,
    /// The cancel signal fired.
    Cancelled,
}

/// Lifecycle of an integrator. There is no pause or resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorState {
    Running,
    Terminated(StopReason),
}

/// Statistics for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub iterations: u64,
    pub energy: f64,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
    pub snapshots_emitted: u64,
}

/// Repulsion on `first` from `second`.
///
/// The multiplier `repulse_constant / distance` is applied to the
/// displacement vector. Coincident points exert no force.
pub fn repulsive_force(first: &Point, second: &Point, config: &SimulationConfig) -> Vector2 {
    let delta = first.delta(second);
    let distance = delta.length();
    if distance == 0.0 {
        return Vector2::ZERO;
    }
    delta.scaled(config.repulse_constant / distance)
}

/// Spring force on `node` from one of its inputs.
///
/// Pushes apart when closer than the rest length, pulls together when
/// farther, and saturates at `spring_multiplier_cap`.
pub fn attractive_force(node: &Point, input: &Point, config: &SimulationConfig) -> Vector2 {
    let delta = node.delta(input);
    let distance = delta.length();

    let offset = (distance - config.spring_stable_distance).abs();
    let multiplier = (offset / config.spring_constant).min(config.spring_multiplier_cap);
    let direction = if distance < config.spring_stable_distance {
        1.0
    } else {
        -1.0
    };

    delta.scaled(multiplier * config.spring_amplifier * direction)
}

/// Sum over nodes of `((|vx| + |vy|) / 2)²`.
pub fn kinetic_metric<'a>(velocities: impl IntoIterator<Item = &'a Vector2>) -> f64 {
    velocities
        .into_iter()
        .map(|v| (v.l1_norm() / 2.0).powi(2))
        .sum()
}

/// Runs the simulation over one graph.
#[derive(Debug)]
pub struct Integrator<K> {
    graph: LayoutGraph<K>,
    config: SimulationConfig,
    budget: Duration,
    checkpoint: Vec<Point>,
    iteration: u64,
    energy: f64,
    previous_energy: Option<f64>,
    state: IntegratorState,
}

impl<K> Integrator<K> {
    pub fn new(graph: LayoutGraph<K>, config: SimulationConfig) -> Self {
        Self {
            graph,
            budget: config.max_duration(),
            config,
            checkpoint: Vec::new(),
            iteration: 0,
            energy: 0.0,
            previous_energy: None,
            state: IntegratorState::Running,
        }
    }

    pub fn graph(&self) -> &LayoutGraph<K> {
        &self.graph
    }

    pub fn into_graph(self) -> LayoutGraph<K> {
        self.graph
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Iterations completed.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Convergence metric after the last iteration.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn state(&self) -> IntegratorState {
        self.state
    }

    /// Raw (unnormalized) positions in arena order.
    pub fn positions(&self) -> Vec<Point> {
        self.graph.positions()
    }

    /// Advance one iteration and return the new convergence metric.
    pub fn step(&mut self) -> f64 {
        #[cfg(feature = "parallel")]
        let repulsion = self.repulsion_pass();

        let config = &self.config;
        let nodes = self.graph.nodes_mut();

        for i in 0..nodes.len() {
            let position = nodes[i].position;
            let mut force = Vector2::ZERO;

            #[cfg(not(feature = "parallel"))]
            for (j, other) in nodes.iter().enumerate() {
                if j != i {
                    force.add(repulsive_force(&position, &other.position, config));
                }
            }

            #[cfg(feature = "parallel")]
            force.add(repulsion[i]);

            for input in &nodes[i].inputs {
                force.add(attractive_force(
                    &position,
                    &nodes[input.index()].position,
                    config,
                ));
            }

            let node = &mut nodes[i];
            node.velocity.add_scaled(force, 1.0);
            node.velocity.scale(config.damping);
            node.position.translate(node.velocity);
        }

        let metric = kinetic_metric(nodes.iter().map(|n| &n.velocity));

        if self.iteration > 0 {
            self.previous_energy = Some(self.energy);
        }
        self.energy = metric;
        self.iteration += 1;
        metric
    }

    /// Repulsion for every node from a snapshot of positions taken at the
    /// start of the iteration. Each node writes only its own accumulator.
    #[cfg(feature = "parallel")]
    fn repulsion_pass(&self) -> Vec<Vector2> {
        use rayon::prelude::*;

        let positions = self.graph.positions();
        let config = &self.config;

        (0..positions.len())
            .into_par_iter()
            .map(|i| {
                let mut force = Vector2::ZERO;
                for (j, other) in positions.iter().enumerate() {
                    if j != i {
                        force.add(repulsive_force(&positions[i], other, config));
                    }
                }
                force
            })
            .collect()
    }

    /// The stop condition that holds after the last iteration, if any.
    pub fn stop_reason(&self, elapsed: Duration) -> Option<StopReason> {
        let config = &self.config;

        let energy_settled = self.iteration >= config.min_iterations
            && self.energy < config.min_energy_threshold
            && (!config.require_decreasing_energy
                || self.previous_energy.is_some_and(|prev| self.energy < prev));

        if energy_settled {
            Some(StopReason::Converged)
        } else if self.iteration >= config.max_iterations {
            Some(StopReason::IterationLimit)
        } else if elapsed >= self.budget {
            Some(StopReason::TimeLimit)
        } else {
            None
        }
    }

    fn is_finite(&self) -> bool {
        self.energy.is_finite()
            && self
                .graph
                .nodes()
                .iter()
                .all(|n| n.position.x.is_finite() && n.position.y.is_finite())
    }

    /// Restore the positions saved before the last tick and stop all motion.
    fn roll_back(&mut self) {
        for (node, position) in self.graph.nodes_mut().iter_mut().zip(&self.checkpoint) {
            node.position = *position;
            node.velocity = Vector2::ZERO;
        }
        self.energy = if self.iteration > 1 {
            self.previous_energy.unwrap_or(0.0)
        } else {
            0.0
        };
    }

    /// Iterate until a stop condition holds or `cancel` fires.
    ///
    /// Progress snapshots go to `sink` at most once per emit interval. On
    /// normal termination one terminal snapshot is always emitted, even if
    /// a progress snapshot with the same positions just went out. A
    /// cancelled run emits no terminal snapshot. A diverged run's terminal
    /// snapshot shows the positions from before the failing tick.
    pub fn run<S, C>(&mut self, sink: &mut S, cancel: &C) -> LayoutResult<RunSummary>
    where
        K: Clone,
        S: SnapshotSink<K>,
        C: CancelSignal + ?Sized,
    {
        let started = Instant::now();
        let mut emitter = ScalerEmitter::new(&self.config, started);

        if let IntegratorState::Terminated(reason) = self.state {
            return Ok(self.summary(reason, started.elapsed(), 0));
        }

        info!(
            nodes = self.graph.len(),
            edges = self.graph.edge_count(),
            max_iterations = self.config.max_iterations,
            "layout_run_start"
        );

        loop {
            if cancel.is_cancelled() {
                self.state = IntegratorState::Terminated(StopReason::Cancelled);
                info!(iteration = self.iteration, "layout_run_cancelled");
                return Ok(self.summary(
                    StopReason::Cancelled,
                    started.elapsed(),
                    emitter.emitted(),
                ));
            }

            self.checkpoint.clear();
            self.checkpoint
                .extend(self.graph.nodes().iter().map(|n| n.position));
            self.step();

            let now = Instant::now();
            let stop = if self.is_finite() {
                if emitter.is_due(now) {
                    emitter.emit_progress(&self.graph, self.iteration, self.energy, sink)?;
                }
                self.stop_reason(now.duration_since(started))
            } else {
                self.roll_back();
                warn!(iteration = self.iteration, "layout_run_diverged");
                Some(StopReason::Diverged)
            };

            if let Some(reason) = stop {
                self.state = IntegratorState::Terminated(reason);
                emitter.emit_terminal(&self.graph, self.iteration, self.energy, sink)?;

                let summary = self.summary(reason, started.elapsed(), emitter.emitted());
                debug!(suppressed = emitter.suppressed(), "progress_filter_stats");
                info!(
                    iterations = summary.iterations,
                    energy = summary.energy,
                    reason = ?reason,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    "layout_run_complete"
                );
                return Ok(summary);
            }
        }
    }

    fn summary(&self, stop_reason: StopReason, elapsed: Duration, emitted: u64) -> RunSummary {
        RunSummary {
            iterations: self.iteration,
            energy: self.energy,
            stop_reason,
            elapsed,
            snapshots_emitted: emitted,
        }
    }
}
