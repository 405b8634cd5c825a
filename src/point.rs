// Data point module - the unit of output of the collection engine

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// How a monitoring system should interpret a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Gauge,
    Counter,
    Untyped,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Gauge => "gauge",
            ValueKind::Counter => "counter",
            ValueKind::Untyped => "untyped",
        };
        f.write_str(name)
    }
}

/// One finished metric sample.
///
/// Created by exactly one extractor and never modified after it has been
/// handed to a sink. Labels live in a `BTreeMap`, so keys are unique and
/// iteration is already sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    /// Fully qualified metric name, e.g. `smartctl_device_temperature`
    pub name: String,

    pub labels: BTreeMap<String, String>,

    pub value: f64,

    pub kind: ValueKind,
}

impl DataPoint {
    pub fn new(name: impl Into<String>, kind: ValueKind, value: f64) -> Self {
        DataPoint {
            name: name.into(),
            labels: BTreeMap::new(),
            value,
            kind,
        }
    }

    /// Adds (or replaces) a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Joins namespace, subsystem and field with `_`, skipping empty parts
///
/// # Example
/// ```
/// use smartctl_collector::point::fq_name;
///
/// assert_eq!(fq_name("smartctl", "device", "temperature"), "smartctl_device_temperature");
/// assert_eq!(fq_name("smartctl", "", "device"), "smartctl_device");
/// ```
pub fn fq_name(namespace: &str, subsystem: &str, field: &str) -> String {
    [namespace, subsystem, field]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_unique_and_sorted() {
        let point = DataPoint::new("smartctl_device_temperature", ValueKind::Gauge, 35.0)
            .with_label("temperature_type", "current")
            .with_label("device", "sda")
            .with_label("device", "sdb");

        let keys: Vec<&str> = point.labels.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["device", "temperature_type"]);
        assert_eq!(point.labels["device"], "sdb");
    }

    #[test]
    fn test_fq_name_skips_empty_parts() {
        assert_eq!(fq_name("", "", "up"), "up");
        assert_eq!(fq_name("smartctl", "read", "total_errors_corrected"), "smartctl_read_total_errors_corrected");
    }
}
