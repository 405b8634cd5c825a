// NVMe extractor
//
// Reads the SMART / Health Information log page (log identifier 02h) as
// smartctl renders it under `nvme_smart_health_information_log`.
//
// The well-known fields get dedicated metrics. Every other numeric field in
// the log is exported through `smartctl_device_nvme_health_log`, keyed by
// field name, so new fields in newer smartctl releases show up without a
// code change.

use serde_json::Value;
use tracing::debug;

use super::{AttributeExtractor, DeviceContext};
use crate::point::{DataPoint, ValueKind};

const LOG: &str = "nvme_smart_health_information_log";

/// One data unit is 1000 blocks of 512 bytes
const BYTES_PER_DATA_UNIT: f64 = 512.0 * 1000.0;

/// Fields exported under their own metric name
const DEDICATED: &[(&str, &str, ValueKind)] = &[
    ("critical_warning", "critical_warning", ValueKind::Gauge),
    ("available_spare", "available_spare", ValueKind::Gauge),
    ("available_spare_threshold", "available_spare_threshold", ValueKind::Gauge),
    ("percentage_used", "percentage_used", ValueKind::Gauge),
    ("media_errors", "media_errors", ValueKind::Counter),
    ("num_err_log_entries", "num_err_log_entries", ValueKind::Counter),
];

/// Fields converted from data units to bytes
const DATA_UNITS: &[(&str, &str)] = &[
    ("data_units_read", "bytes_read"),
    ("data_units_written", "bytes_written"),
];

/// Fields smartctl already copies to the top level of the document
const MIRRORED: &[&str] = &["temperature", "power_cycles", "power_on_hours"];

pub struct NvmeExtractor;

impl NvmeExtractor {
    fn is_handled(field: &str) -> bool {
        DEDICATED.iter().any(|(name, _, _)| *name == field)
            || DATA_UNITS.iter().any(|(name, _)| *name == field)
            || MIRRORED.contains(&field)
    }

    fn health_log_point(device: &DeviceContext<'_>, name: &str, value: f64) -> DataPoint {
        device
            .untyped("device", "nvme_health_log", value)
            .with_label("attribute_name", name)
    }

    /// Everything not covered by a dedicated metric
    fn remaining_fields(device: &DeviceContext<'_>, log: &serde_json::Map<String, Value>) -> Vec<DataPoint> {
        let mut points = Vec::new();

        for (field, value) in log.iter().filter(|(field, _)| !Self::is_handled(field)) {
            match value {
                // e.g. temperature_sensors: [35, 38]
                Value::Array(items) => {
                    let singular = field.strip_suffix('s').unwrap_or(field);
                    for (index, item) in items.iter().enumerate() {
                        if let Some(v) = device.number_in(item, "") {
                            let name = format!("{}_{}", singular, index + 1);
                            points.push(Self::health_log_point(device, &name, v));
                        }
                    }
                }
                Value::Object(_) => {
                    debug!(device = device.label(), field = field.as_str(), "Ignoring nested NVMe log field");
                }
                other => {
                    if let Some(v) = device.number_in(other, "") {
                        points.push(Self::health_log_point(device, field, v));
                    }
                }
            }
        }

        points
    }
}

impl AttributeExtractor for NvmeExtractor {
    fn name(&self) -> &str {
        "nvme"
    }

    fn extract(&self, device: &DeviceContext<'_>) -> Vec<DataPoint> {
        let Some(log) = device.object(LOG) else {
            return Vec::new();
        };
        let log_value = &device.document()[LOG];

        let mut points = Vec::new();

        for (field, metric, kind) in DEDICATED {
            if let Some(value) = device.number_in(log_value, field) {
                points.push(device.point("device", metric, *kind, value));
            }
        }

        for (field, metric) in DATA_UNITS {
            if let Some(units) = device.number_in(log_value, field) {
                points.push(device.counter("device", metric, units * BYTES_PER_DATA_UNIT));
            }
        }

        points.extend(Self::remaining_fields(device, log));
        points
    }
}
