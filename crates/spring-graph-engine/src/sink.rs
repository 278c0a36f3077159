//! Channel-backed snapshot sink used by the worker thread.

use spring_graph_layout::{CoordinateSnapshot, SinkError, SnapshotSink};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace};

/// Forwards snapshots into a bounded channel.
///
/// Progress snapshots never block: a full channel drops them and a closed
/// one ignores them. The terminal snapshot waits for room and fails the run
/// if nobody is listening.
pub(crate) struct ChannelSink<K> {
    tx: mpsc::Sender<CoordinateSnapshot<K>>,
    dropped: u64,
}

impl<K> ChannelSink<K> {
    pub(crate) fn new(tx: mpsc::Sender<CoordinateSnapshot<K>>) -> Self {
        Self { tx, dropped: 0 }
    }
}

impl<K> Drop for ChannelSink<K> {
    fn drop(&mut self) {
        if self.dropped > 0 {
            debug!(dropped = self.dropped, "progress_snapshots_dropped");
        }
    }
}

impl<K> SnapshotSink<K> for ChannelSink<K> {
    fn emit(&mut self, snapshot: CoordinateSnapshot<K>) -> Result<(), SinkError> {
        if snapshot.is_terminal() {
            return self
                .tx
                .blocking_send(snapshot)
                .map_err(|_| SinkError::disconnected());
        }

        match self.tx.try_send(snapshot) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(snapshot)) => {
                trace!(iteration = snapshot.iteration, "progress_snapshot_dropped");
                self.dropped += 1;
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(iteration: u64, terminal: bool) -> CoordinateSnapshot<u32> {
        CoordinateSnapshot {
            points: Vec::new(),
            iteration,
            energy: 0.0,
            terminal,
        }
    }

    #[test]
    fn test_full_channel_drops_progress() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut sink = ChannelSink::new(tx);

        sink.emit(snapshot(1, false)).unwrap();
        sink.emit(snapshot(2, false)).unwrap();

        assert_eq!(sink.dropped, 1);
        assert_eq!(rx.try_recv().unwrap().iteration, 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_ignores_progress_but_fails_terminal() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut sink = ChannelSink::new(tx);

        assert!(sink.emit(snapshot(1, false)).is_ok());
        assert!(sink.emit(snapshot(2, true)).is_err());
    }

    #[test]
    fn test_terminal_is_delivered() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut sink = ChannelSink::new(tx);

        sink.emit(snapshot(7, true)).unwrap();
        let received = rx.try_recv().unwrap();
        assert!(received.is_terminal());
        assert_eq!(received.iteration, 7);
    }
}
