// Metrics module - the attribute extractors
//
// Each extractor reads one family of sections from a smartctl JSON document
// and turns it into data points. Extractors never fail: a missing section
// yields nothing, a field of the wrong type is logged and skipped.
//
// The collector runs every enabled extractor against every document; an
// extractor whose sections are absent simply produces no points.

use serde_json::{Map, Value};
use tracing::warn;

use crate::document::{self, Field};
use crate::point::{fq_name, DataPoint, ValueKind};

pub mod ata;
pub mod health;
pub mod identity;
pub mod nvme;
pub mod power;
pub mod scsi;
pub mod statistics;
pub mod temperature;

/// Default metric namespace
pub const DEFAULT_NAMESPACE: &str = "smartctl";

/// Core trait that all attribute extractors implement.
///
/// Extractors are pure: the same document always yields the same points.
pub trait AttributeExtractor: Send + Sync {
    /// Short name, used in configuration and logs
    fn name(&self) -> &str;

    /// Reads the extractor's sections and returns the resulting points
    fn extract(&self, device: &DeviceContext<'_>) -> Vec<DataPoint>;
}

/// Instantiates every extractor.
///
/// When adding a new extractor, add its instantiation here.
pub fn create_all_extractors() -> Vec<Box<dyn AttributeExtractor>> {
    vec![
        // Model, serial, capacity, interface speed, exit status
        Box::new(identity::IdentityExtractor),

        // Overall SMART pass/fail
        Box::new(health::HealthExtractor),

        // Every sensor in the `temperature` object
        Box::new(temperature::TemperatureExtractor),

        // Power-on time and power cycles (ATA, NVMe, SCSI)
        Box::new(power::PowerExtractor),

        // ATA SMART attribute table, error/self-test logs, ERC, SCT
        Box::new(ata::AtaExtractor),

        // ATA device statistics pages and SATA PHY event counters
        Box::new(statistics::StatisticsExtractor),

        // NVMe SMART/health information log
        Box::new(nvme::NvmeExtractor),

        // SCSI error counter log and grown defect list
        Box::new(scsi::ScsiExtractor),
    ]
}

/// Everything an extractor needs to know about the device being collected
pub struct DeviceContext<'a> {
    document: &'a Value,
    label: &'a str,
    namespace: &'a str,
}

impl<'a> DeviceContext<'a> {
    pub fn new(document: &'a Value, label: &'a str, namespace: &'a str) -> Self {
        DeviceContext {
            document,
            label,
            namespace,
        }
    }

    pub fn document(&self) -> &'a Value {
        self.document
    }

    /// The `device` label value for this document
    pub fn label(&self) -> &'a str {
        self.label
    }

    /// Starts a data point already carrying the `device` label
    pub fn point(&self, subsystem: &str, field: &str, kind: ValueKind, value: f64) -> DataPoint {
        DataPoint::new(fq_name(self.namespace, subsystem, field), kind, value)
            .with_label("device", self.label)
    }

    pub fn gauge(&self, subsystem: &str, field: &str, value: f64) -> DataPoint {
        self.point(subsystem, field, ValueKind::Gauge, value)
    }

    pub fn counter(&self, subsystem: &str, field: &str, value: f64) -> DataPoint {
        self.point(subsystem, field, ValueKind::Counter, value)
    }

    pub fn untyped(&self, subsystem: &str, field: &str, value: f64) -> DataPoint {
        self.point(subsystem, field, ValueKind::Untyped, value)
    }

    /// Reads a number from the document root
    pub fn number(&self, path: &str) -> Option<f64> {
        self.number_in(self.document, path)
    }

    /// Reads a number relative to `node`, warning on a type mismatch
    pub fn number_in(&self, node: &Value, path: &str) -> Option<f64> {
        self.settle(path, document::number(node, path))
    }

    /// Like `number`, but keeps absent and mismatched apart
    pub fn number_field(&self, path: &str) -> Field<f64> {
        let field = document::number(self.document, path);
        if let Field::Mismatch(found) = field {
            warn!(
                device = self.label,
                path, found, "Skipping field with unexpected JSON type"
            );
        }
        field
    }

    /// Reads a string from the document root
    pub fn string(&self, path: &str) -> Option<&'a str> {
        self.settle(path, document::string(self.document, path))
    }

    pub fn string_in<'n>(&self, node: &'n Value, path: &str) -> Option<&'n str> {
        self.settle(path, document::string(node, path))
    }

    pub fn boolean_in(&self, node: &Value, path: &str) -> Option<bool> {
        self.settle(path, document::boolean(node, path))
    }

    pub fn array(&self, path: &str) -> Option<&'a [Value]> {
        self.settle(path, document::array(self.document, path))
    }

    pub fn array_in<'n>(&self, node: &'n Value, path: &str) -> Option<&'n [Value]> {
        self.settle(path, document::array(node, path))
    }

    pub fn object(&self, path: &str) -> Option<&'a Map<String, Value>> {
        self.settle(path, document::object(self.document, path))
    }

    /// Absent fields are expected and silent; mismatches are worth a warning
    fn settle<T>(&self, path: &str, field: Field<T>) -> Option<T> {
        match field {
            Field::Present(value) => Some(value),
            Field::Absent => None,
            Field::Mismatch(found) => {
                warn!(
                    device = self.label,
                    path, found, "Skipping field with unexpected JSON type"
                );
                None
            }
        }
    }
}

/// Joins the names of the flags set to `true`, in the given order
///
/// smartctl describes attribute flags both as a compact string (`PO--CK`)
/// and as individual booleans. The long form is rebuilt from the booleans.
pub(crate) fn long_flags(flags: Option<&Value>, names: &[&str]) -> String {
    let Some(flags) = flags else {
        return String::new();
    };

    names
        .iter()
        .filter(|name| flags.get(**name).and_then(Value::as_bool).unwrap_or(false))
        .copied()
        .collect::<Vec<_>>()
        .join(",")
}

/// Formats a number for use as a label value (`5`, not `5.0`)
pub(crate) fn number_label(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Runs one extractor against a document and returns its points
    pub fn run(extractor: &dyn AttributeExtractor, document: &Value) -> Vec<DataPoint> {
        let context = DeviceContext::new(document, "sda", DEFAULT_NAMESPACE);
        extractor.extract(&context)
    }

    /// Finds the single point with the given name and label subset
    pub fn find<'p>(points: &'p [DataPoint], name: &str, labels: &[(&str, &str)]) -> &'p DataPoint {
        let matches: Vec<&DataPoint> = points
            .iter()
            .filter(|p| p.name == name)
            .filter(|p| labels.iter().all(|(k, v)| p.labels.get(*k).map(String::as_str) == Some(*v)))
            .collect();
        assert_eq!(matches.len(), 1, "expected one {} {:?}, got {:?}", name, labels, matches);
        matches[0]
    }
}
