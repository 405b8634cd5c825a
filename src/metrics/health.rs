// Health extractor
//
// The overall SMART verdict. smartctl reports it for every protocol as
// `smart_status.passed`.

use super::{AttributeExtractor, DeviceContext};
use crate::point::DataPoint;

pub struct HealthExtractor;

impl AttributeExtractor for HealthExtractor {
    fn name(&self) -> &str {
        "health"
    }

    fn extract(&self, device: &DeviceContext<'_>) -> Vec<DataPoint> {
        match device.boolean_in(device.document(), "smart_status.passed") {
            Some(passed) => vec![device.gauge("device", "smart_status", if passed { 1.0 } else { 0.0 })],
            None => Vec::new(),
        }
    }
}
