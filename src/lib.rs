// smartctl-collector
//
// Turns the JSON output of `smartctl --json` into normalized metric data
// points for a pull-based monitoring system.
//
// Data flow:
// raw JSON -> parsed document -> SmartCollector -> attribute extractors
//          -> data points -> MetricSink -> exposition text

pub mod collector;
pub mod config;
pub mod document;
pub mod exposition;
pub mod label;
pub mod metrics;
pub mod point;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod status;

pub use collector::{parse_document, CollectError, CollectSummary, DeviceFamily, SmartCollector};
pub use label::build_device_label;
pub use point::{DataPoint, ValueKind};
pub use sink::{ChannelSink, MemorySink, MetricSink, SinkError};
