//! Background-run behavior of the layout engine.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use spring_graph_engine::{EngineError, LayoutEngine, RunOutcome};
use spring_graph_layout::{
    AdapterError, CoordinateSnapshot, GraphAdapter, LayoutError, SimulationConfig, SinkError,
};

/// Nodes are plain labels, edges are label pairs.
struct LabelAdapter;

impl GraphAdapter<String, (String, String)> for LabelAdapter {
    type Key = String;

    fn key_of(&self, node: &String) -> Result<String, AdapterError> {
        Ok(node.clone())
    }

    fn source_key_of(&self, edge: &(String, String)) -> Result<Option<String>, AdapterError> {
        Ok(Some(edge.0.clone()))
    }

    fn destination_key_of(
        &self,
        edge: &(String, String),
    ) -> Result<Option<String>, AdapterError> {
        Ok(Some(edge.1.clone()))
    }
}

fn chain(len: usize) -> (Vec<String>, Vec<(String, String)>) {
    let nodes: Vec<String> = (0..len).map(|i| format!("n{}", i)).collect();
    let edges = nodes
        .windows(2)
        .map(|w| (w[0].clone(), w[1].clone()))
        .collect();
    (nodes, edges)
}

fn short_config() -> SimulationConfig {
    SimulationConfig {
        max_iterations: 500,
        max_seconds: 60.0,
        ..Default::default()
    }
}

/// A configuration that keeps a chain running until cancelled.
fn endless_config() -> SimulationConfig {
    SimulationConfig {
        max_iterations: u64::MAX,
        max_seconds: 600.0,
        emit_interval_ms: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_run_to_completion_returns_terminal_snapshot() {
    let engine = LayoutEngine::new(LabelAdapter, short_config());
    let (nodes, edges) = chain(4);

    let snapshot = engine.run_to_completion(nodes, edges).await.unwrap();

    assert!(snapshot.is_terminal());
    assert_eq!(snapshot.len(), 4);
    assert!(snapshot.position(&"n3".to_string()).is_some());
    assert!(!engine.is_running());
}

#[tokio::test]
async fn test_stream_ends_with_terminal_snapshot() {
    let config = SimulationConfig {
        emit_interval_ms: 0,
        ..short_config()
    };
    let engine = LayoutEngine::new(LabelAdapter, config).with_channel_capacity(1024);
    let (nodes, edges) = chain(3);

    let mut run = engine.start(nodes, edges).unwrap();
    let mut received: Vec<CoordinateSnapshot<String>> = Vec::new();
    while let Some(snapshot) = run.next_snapshot().await {
        received.push(snapshot);
    }

    assert!(!received.is_empty());
    assert!(received.last().unwrap().is_terminal());
    assert_eq!(received.iter().filter(|s| s.is_terminal()).count(), 1);
    assert!(run.outcome().await.is_completed());
}

#[tokio::test]
async fn test_second_concurrent_run_is_rejected() {
    let engine = LayoutEngine::new(LabelAdapter, endless_config());
    let (nodes, edges) = chain(3);

    let first = engine.start(nodes.clone(), edges.clone()).unwrap();
    assert!(engine.is_running());

    let second = engine.start(nodes.clone(), edges.clone());
    assert!(matches!(second, Err(EngineError::RunInProgress)));

    first.cancel();
    assert!(first.outcome().await.is_cancelled());
    assert!(!engine.is_running());

    // The engine is reusable once the first run is over.
    let third = engine.start(nodes, edges).unwrap();
    third.cancel();
    assert!(third.outcome().await.is_cancelled());
}

#[tokio::test]
async fn test_cancel_stops_without_terminal_snapshot() {
    let engine = LayoutEngine::new(LabelAdapter, endless_config()).with_channel_capacity(4);
    let (nodes, edges) = chain(5);

    let mut run = engine.start(nodes, edges).unwrap();
    let first = run.next_snapshot().await.unwrap();
    assert!(!first.is_terminal());

    run.cancel();
    let report = run.finish().await;

    assert!(report.outcome.is_cancelled());
    if let Some(last) = report.last_snapshot {
        assert!(!last.is_terminal());
    }
}

#[tokio::test]
async fn test_external_token_cancels_run() {
    let engine = LayoutEngine::new(LabelAdapter, endless_config());
    let (nodes, edges) = chain(3);

    let mut run = engine.start(nodes, edges).unwrap();
    let token = run.cancellation_token();
    run.next_snapshot().await.unwrap();
    token.cancel();

    let report = run.finish().await;
    assert!(matches!(report.outcome, RunOutcome::Cancelled));
}

#[tokio::test]
async fn test_sink_failure_reports_failed() {
    let config = SimulationConfig {
        emit_interval_ms: 0,
        ..short_config()
    };
    let engine = LayoutEngine::new(LabelAdapter, config);
    let (nodes, edges) = chain(2);

    let handle = engine
        .start_with_sink(nodes, edges, |_: CoordinateSnapshot<String>| -> Result<(), SinkError> {
            Err(SinkError::new("renderer gone"))
        })
        .unwrap();

    match handle.outcome().await {
        RunOutcome::Failed(EngineError::Layout(LayoutError::Sink(err))) => {
            assert_eq!(err.to_string(), "renderer gone");
        }
        other => panic!("expected sink failure, got {:?}", other),
    }
    assert!(!engine.is_running());
}

#[tokio::test]
async fn test_callback_sink_sees_every_snapshot() {
    let config = SimulationConfig {
        emit_interval_ms: 0,
        max_iterations: 25,
        min_energy_threshold: 0.0,
        ..Default::default()
    };
    let engine = LayoutEngine::new(LabelAdapter, config);
    let (nodes, edges) = chain(2);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);

    let handle = engine
        .start_with_sink(nodes, edges, move |s: CoordinateSnapshot<String>| -> Result<(), SinkError> {
            sink_seen.lock().unwrap().push((s.iteration, s.terminal));
            Ok(())
        })
        .unwrap();

    let outcome = handle.outcome().await;
    assert_eq!(outcome.summary().unwrap().iterations, 25);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 26);
    assert_eq!(seen.last(), Some(&(25, true)));
}

#[tokio::test]
async fn test_dropped_receiver_fails_terminal_delivery() {
    let engine = LayoutEngine::new(LabelAdapter, short_config());
    let (nodes, edges) = chain(3);

    let (receiver, handle) = engine.start(nodes, edges).unwrap().into_parts();
    drop(receiver);

    assert!(matches!(
        handle.outcome().await,
        RunOutcome::Failed(EngineError::Layout(LayoutError::Sink(_)))
    ));
}

#[tokio::test]
async fn test_duplicate_nodes_fail_the_run() {
    let engine = LayoutEngine::new(LabelAdapter, short_config());
    let nodes = vec!["a".to_string(), "a".to_string()];

    let err = engine
        .run_to_completion(nodes, Vec::<(String, String)>::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Layout(LayoutError::DuplicateKey { .. })
    ));
}

/// Poll until the engine reports idle, failing after five seconds.
async fn wait_until_idle<A>(engine: &LayoutEngine<A>) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while engine.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("engine still busy after the run was dropped");
}

#[tokio::test]
async fn test_dropping_a_run_cancels_it() {
    let engine = LayoutEngine::new(LabelAdapter, endless_config());
    let (nodes, edges) = chain(4);

    let mut run = engine.start(nodes.clone(), edges.clone()).unwrap();
    run.next_snapshot().await.unwrap();
    drop(run);

    wait_until_idle(&engine).await;

    let next = engine.start(nodes, edges).unwrap();
    next.cancel();
    assert!(next.outcome().await.is_cancelled());
}

#[tokio::test]
async fn test_dropping_a_sink_handle_cancels_it() {
    let engine = LayoutEngine::new(LabelAdapter, endless_config());
    let (nodes, edges) = chain(4);

    let handle = engine
        .start_with_sink(nodes, edges, |_: CoordinateSnapshot<String>| -> Result<(), SinkError> {
            Ok(())
        })
        .unwrap();
    drop(handle);

    wait_until_idle(&engine).await;
    assert!(!engine.is_running());
}
