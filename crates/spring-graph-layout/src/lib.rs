//! Force-directed spring layout for arbitrary directed graphs.
//!
//! The crate computes 2D positions for the nodes of a graph by running a
//! small physical simulation: every pair of nodes repels, every edge acts as
//! a capped spring, and velocities are damped each tick until the system
//! settles or a time/iteration budget runs out.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌─────────────┐    ┌─────────────┐    ┌──────────────┐
//! │ GraphBuilder │───▶│  PreSolver  │───▶│ Integrator  │───▶│ScalerEmitter │──▶ sink
//! │ (key arena)  │    │ (depth rank)│    │ (physics)   │    │ (normalize)  │
//! └──────────────┘    └─────────────┘    └─────────────┘    └──────────────┘
//! ```
//!
//! Nodes and edges are opaque to the engine. A [`GraphAdapter`] extracts a
//! [`NodeKey`] from each node and the endpoint keys from each edge; nothing
//! else about the host objects is ever touched.
//!
//! ## Example
//!
//! ```
//! use spring_graph_layout::{
//!     CoordinateSnapshot, FnAdapter, ForceLayout, NeverCancel, SimulationConfig,
//! };
//!
//! let nodes = vec!["a", "b", "c"];
//! let edges = vec![("a", "b"), ("b", "c")];
//! let adapter = FnAdapter::new(
//!     |n: &&str| n.to_string(),
//!     |e: &(&str, &str)| Some(e.0.to_string()),
//!     |e: &(&str, &str)| Some(e.1.to_string()),
//! );
//!
//! let config = SimulationConfig {
//!     max_iterations: 200,
//!     ..Default::default()
//! };
//! let mut snapshots: Vec<CoordinateSnapshot<String>> = Vec::new();
//! let summary = ForceLayout::new(adapter, config)
//!     .layout(&nodes, &edges, &mut snapshots, &NeverCancel)
//!     .unwrap();
//!
//! assert!(summary.iterations <= 200);
//! assert!(snapshots.last().unwrap().is_terminal());
//! ```

mod adapter;
mod config;
mod error;
mod force_layout;
mod graph;
mod integrator;
mod presolve;
mod scaler;
mod snapshot;
mod vector;

pub use adapter::{AdapterError, FnAdapter, GraphAdapter, NodeKey};
pub use config::SimulationConfig;
pub use error::{LayoutError, LayoutResult};
pub use force_layout::ForceLayout;
pub use graph::{BuildReport, GraphBuilder, LayoutGraph, NodeIndex, NodeState};
pub use integrator::{
    attractive_force, kinetic_metric, repulsive_force, CancelSignal, Integrator, IntegratorState,
    NeverCancel, RunSummary, StopReason,
};
pub use presolve::PreSolver;
pub use scaler::{Bounds, Scaler, ScalerEmitter};
pub use snapshot::{CoordinateSnapshot, SinkError, SnapshotSink};
pub use vector::{Point, Vector2};
