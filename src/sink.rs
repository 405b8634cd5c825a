// Sink module - where finished data points go
//
// The collector only ever writes. Two implementations are provided:
// 1. MemorySink - a mutex-guarded buffer, useful for tests and one-shot runs
// 2. ChannelSink - a handle onto a bounded tokio channel, so several
//    collectors running in parallel can funnel into one export buffer

use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::error;

use crate::point::DataPoint;

/// Errors that can occur while pushing a data point
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SinkError {
    #[error("metric sink is full (capacity {0}); increase sink_capacity")]
    Full(usize),

    #[error("metric sink has been closed")]
    Closed,

    #[error("metric sink lock poisoned")]
    Poisoned,
}

/// Destination for finished data points.
///
/// `push` must not block indefinitely. A sink that cannot accept a point
/// reports an error instead; the collector treats that as fatal.
pub trait MetricSink: Send + Sync {
    fn push(&self, point: DataPoint) -> Result<(), SinkError>;
}

impl<S: MetricSink + ?Sized> MetricSink for &S {
    fn push(&self, point: DataPoint) -> Result<(), SinkError> {
        (**self).push(point)
    }
}

/// Append-only in-memory buffer
#[derive(Debug, Default)]
pub struct MemorySink {
    points: Mutex<Vec<DataPoint>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points pushed so far
    pub fn len(&self) -> usize {
        self.points.lock().map(|points| points.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the sink and returns everything pushed into it
    pub fn into_points(self) -> Result<Vec<DataPoint>, SinkError> {
        self.points.into_inner().map_err(|_| SinkError::Poisoned)
    }
}

impl MetricSink for MemorySink {
    fn push(&self, point: DataPoint) -> Result<(), SinkError> {
        let mut points = self.points.lock().map_err(|_| SinkError::Poisoned)?;
        points.push(point);
        Ok(())
    }
}

/// Producer handle onto a bounded channel.
///
/// Uses `try_send`, so a full channel is reported immediately rather than
/// stalling the collector.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<DataPoint>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<DataPoint>) -> Self {
        ChannelSink { sender }
    }

    /// Creates a bounded channel and returns the producer handle with its receiver
    ///
    /// # Example
    /// ```
    /// use smartctl_collector::sink::ChannelSink;
    ///
    /// let (sink, mut receiver) = ChannelSink::bounded(128);
    /// drop(sink);
    /// assert!(receiver.try_recv().is_err());
    /// ```
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<DataPoint>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (ChannelSink::new(sender), receiver)
    }
}

impl MetricSink for ChannelSink {
    fn push(&self, point: DataPoint) -> Result<(), SinkError> {
        self.sender.try_send(point).map_err(|e| match e {
            mpsc::error::TrySendError::Full(point) => {
                error!(
                    "Dropping {}: sink full at capacity {}",
                    point.name,
                    self.sender.max_capacity()
                );
                SinkError::Full(self.sender.max_capacity())
            }
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::ValueKind;

    fn point(n: f64) -> DataPoint {
        DataPoint::new("smartctl_test", ValueKind::Gauge, n)
    }

    #[test]
    fn test_memory_sink_keeps_everything() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.push(point(1.0)).unwrap();
        (&sink).push(point(2.0)).unwrap();

        assert_eq!(sink.len(), 2);
        let points = sink.into_points().unwrap();
        assert_eq!(points[1].value, 2.0);
    }

    #[test]
    fn test_channel_sink_reports_full() {
        let (sink, mut receiver) = ChannelSink::bounded(2);

        sink.push(point(1.0)).unwrap();
        sink.push(point(2.0)).unwrap();
        assert_eq!(sink.push(point(3.0)), Err(SinkError::Full(2)));

        assert_eq!(receiver.try_recv().unwrap().value, 1.0);
        sink.push(point(4.0)).unwrap();
    }

    #[test]
    fn test_channel_sink_reports_closed() {
        let (sink, receiver) = ChannelSink::bounded(4);
        drop(receiver);
        assert_eq!(sink.push(point(1.0)), Err(SinkError::Closed));
    }
}
