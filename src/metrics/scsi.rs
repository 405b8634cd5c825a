// SCSI/SAS extractor
//
// Reads the error counter log (one block per operation: read, write,
// verify), the grown defect list and the SSD endurance indicator.

use super::{AttributeExtractor, DeviceContext};
use crate::point::DataPoint;

const OPERATIONS: &[&str] = &["read", "write", "verify"];

const COUNTERS: &[&str] = &[
    "errors_corrected_by_eccfast",
    "errors_corrected_by_eccdelayed",
    "errors_corrected_by_rereads_rewrites",
    "total_errors_corrected",
    "correction_algorithm_invocations",
    "gigabytes_processed",
    "total_uncorrected_errors",
];

/// smartctl reports processed volume in decimal gigabytes
const BYTES_PER_GIGABYTE: f64 = 1e9;

pub struct ScsiExtractor;

impl AttributeExtractor for ScsiExtractor {
    fn name(&self) -> &str {
        "scsi"
    }

    fn extract(&self, device: &DeviceContext<'_>) -> Vec<DataPoint> {
        let mut points = Vec::new();

        if let Some(defects) = device.number("scsi_grown_defect_list") {
            points.push(device.gauge("scsi", "grown_defect_list", defects));
        }

        if let Some(used) = device.number("scsi_percentage_used_endurance_indicator") {
            points.push(device.gauge("device", "percentage_used", used));
        }

        if device.object("scsi_error_counter_log").is_none() {
            return points;
        }

        for operation in OPERATIONS {
            for counter in COUNTERS {
                let path = format!("scsi_error_counter_log.{}.{}", operation, counter);
                if let Some(value) = device.number(&path) {
                    points.push(device.gauge(operation, counter, value));
                }
            }
        }

        for (operation, metric) in [("read", "bytes_read"), ("write", "bytes_written")] {
            let path = format!("scsi_error_counter_log.{}.gigabytes_processed", operation);
            if let Some(gigabytes) = device.number(&path) {
                points.push(device.counter("device", metric, gigabytes * BYTES_PER_GIGABYTE));
            }
        }

        points
    }
}
