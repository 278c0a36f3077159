//! Layout command implementation.
//!
//! Loads a graph document, runs the engine in the background and prints the
//! final coordinates. Progress snapshots can be streamed as JSON lines.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use spring_graph_engine::{LayoutEngine, RunOutcome};
use spring_graph_layout::{CoordinateSnapshot, RunSummary, SimulationConfig, StopReason};
use tracing::{info, warn};

use crate::config::Config;
use crate::document::{DocumentAdapter, GraphDocument};

/// Output format for the final layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "table" | "text" => Ok(Self::Table),
            _ => anyhow::bail!("Unknown format: {}. Use 'json' or 'table'", s),
        }
    }
}

/// Flags of `sg layout`. Set flags override the loaded configuration.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub graph: PathBuf,
    pub stream: bool,
    pub format: OutputFormat,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub max_seconds: Option<f64>,
    pub max_iterations: Option<u64>,
    pub margin: Option<f64>,
    pub output: Option<PathBuf>,
}

impl LayoutOptions {
    fn apply(&self, config: &mut Config) {
        let sim = &mut config.simulation;
        if let Some(width) = self.width {
            sim.output_width = width;
        }
        if let Some(height) = self.height {
            sim.output_height = height;
        }
        if let Some(seconds) = self.max_seconds {
            sim.max_seconds = seconds;
        }
        if let Some(iterations) = self.max_iterations {
            sim.max_iterations = iterations;
        }
        if let Some(margin) = self.margin {
            config.margin = margin;
        }
    }
}

#[derive(Debug, Serialize)]
struct NodePosition<'a> {
    id: &'a str,
    x: f64,
    y: f64,
}

fn positions(snapshot: &CoordinateSnapshot<String>) -> Vec<NodePosition<'_>> {
    snapshot
        .iter()
        .map(|(id, point)| NodePosition {
            id: id.as_str(),
            x: point.x,
            y: point.y,
        })
        .collect()
}

/// One streamed progress snapshot.
#[derive(Debug, Serialize)]
struct ProgressLine<'a> {
    iteration: u64,
    energy: f64,
    nodes: Vec<NodePosition<'a>>,
}

/// The final layout with run statistics.
#[derive(Debug, Serialize)]
struct LayoutReport<'a> {
    stop_reason: StopReason,
    iterations: u64,
    energy: f64,
    elapsed_ms: u64,
    width: f64,
    height: f64,
    nodes: Vec<NodePosition<'a>>,
}

/// Run a layout to completion and print or write the result.
pub async fn execute(mut config: Config, options: LayoutOptions) -> Result<()> {
    options.apply(&mut config);
    config.validate()?;
    let simulation = config.effective_simulation();

    let document = GraphDocument::load(&options.graph)?;
    info!(
        path = %options.graph.display(),
        nodes = document.nodes.len(),
        edges = document.edges.len(),
        "graph_document_loaded"
    );

    let engine = LayoutEngine::new(DocumentAdapter, simulation.clone());
    let mut run = engine.start(document.nodes, document.edges)?;
    let token = run.cancellation_token();

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);
    let mut interrupted = false;
    let mut last: Option<CoordinateSnapshot<String>> = None;

    loop {
        tokio::select! {
            next = run.next_snapshot() => {
                let Some(snapshot) = next else { break };
                if options.stream && !snapshot.is_terminal() {
                    let line = ProgressLine {
                        iteration: snapshot.iteration,
                        energy: snapshot.energy,
                        nodes: positions(&snapshot),
                    };
                    println!("{}", serde_json::to_string(&line)?);
                }
                last = Some(snapshot);
            }
            _ = &mut interrupt, if !interrupted => {
                warn!("interrupt_received");
                token.cancel();
                interrupted = true;
            }
        }
    }

    let summary = match run.outcome().await {
        RunOutcome::Completed(summary) => summary,
        RunOutcome::Cancelled => anyhow::bail!("Layout cancelled before it finished"),
        RunOutcome::Failed(err) => return Err(err).context("Layout failed"),
    };
    if summary.stop_reason == StopReason::Diverged {
        warn!(
            iterations = summary.iterations,
            "layout_diverged"
        );
    }
    let snapshot = last.context("Layout finished without a final snapshot")?;

    let rendered = render(&snapshot, &summary, &simulation, options.format, options.stream)?;
    match &options.output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write layout to {}", path.display()))?;
            info!(path = %path.display(), "layout_written");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn render(
    snapshot: &CoordinateSnapshot<String>,
    summary: &RunSummary,
    simulation: &SimulationConfig,
    format: OutputFormat,
    compact: bool,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let report = LayoutReport {
                stop_reason: summary.stop_reason,
                iterations: summary.iterations,
                energy: summary.energy,
                elapsed_ms: summary.elapsed.as_millis() as u64,
                width: simulation.output_width,
                height: simulation.output_height,
                nodes: positions(snapshot),
            };
            Ok(if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            })
        }
        OutputFormat::Table => Ok(render_table(snapshot, summary)),
    }
}

fn render_table(snapshot: &CoordinateSnapshot<String>, summary: &RunSummary) -> String {
    let id_width = snapshot
        .iter()
        .map(|(id, _)| id.chars().count())
        .max()
        .unwrap_or(0)
        .max(2);

    let mut out = format!("{:<id_width$}  {:>10}  {:>10}\n", "id", "x", "y");
    out.push_str(&format!("{:-<width$}\n", "", width = id_width + 24));
    for (id, point) in snapshot.iter() {
        out.push_str(&format!(
            "{:<id_width$}  {:>10.3}  {:>10.3}\n",
            id, point.x, point.y
        ));
    }
    out.push_str(&format!(
        "\n{} nodes, {:?} after {} iterations (energy {:.3e}, {} ms)",
        snapshot.len(),
        summary.stop_reason,
        summary.iterations,
        summary.energy,
        summary.elapsed.as_millis()
    ));
    out
}
