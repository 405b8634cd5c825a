// Power extractor
//
// Power-on time and power cycle count. ATA and NVMe report the cycle
// count at the top level; SCSI devices only have the start/stop cycle
// counter, which is used as a fallback.

use super::{AttributeExtractor, DeviceContext};
use crate::document::Field;
use crate::point::DataPoint;

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

pub struct PowerExtractor;

impl PowerExtractor {
    /// `hours * 3600 + minutes * 60`; a missing part counts as zero, but
    /// at least one part must be present and neither may be mistyped
    fn power_on_seconds(device: &DeviceContext<'_>) -> Option<f64> {
        let hours = device.number_field("power_on_time.hours");
        let minutes = device.number_field("power_on_time.minutes");

        match (hours, minutes) {
            (Field::Mismatch(_), _) | (_, Field::Mismatch(_)) => None,
            (Field::Absent, Field::Absent) => None,
            (hours, minutes) => Some(
                hours.present().unwrap_or(0.0) * SECONDS_PER_HOUR
                    + minutes.present().unwrap_or(0.0) * SECONDS_PER_MINUTE,
            ),
        }
    }
}

impl AttributeExtractor for PowerExtractor {
    fn name(&self) -> &str {
        "power"
    }

    fn extract(&self, device: &DeviceContext<'_>) -> Vec<DataPoint> {
        let mut points = Vec::new();

        if let Some(seconds) = Self::power_on_seconds(device) {
            points.push(device.counter("device", "power_on_seconds", seconds));
        }

        let cycles = device
            .number("power_cycle_count")
            .or_else(|| device.number("scsi_start_stop_cycle_counter.accumulated_start_stop_cycles"));
        if let Some(cycles) = cycles {
            points.push(device.counter("device", "power_cycle_count", cycles));
        }

        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{find, run};
    use crate::point::ValueKind;
    use serde_json::json;

    #[test]
    fn test_power_on_seconds() {
        let doc = json!({ "power_on_time": { "hours": 2, "minutes": 30 }, "power_cycle_count": 12 });
        let points = run(&PowerExtractor, &doc);

        let on = find(&points, "smartctl_device_power_on_seconds", &[]);
        assert_eq!(on.value, 9000.0);
        assert_eq!(on.kind, ValueKind::Counter);
        assert_eq!(find(&points, "smartctl_device_power_cycle_count", &[]).value, 12.0);
    }

    #[test]
    fn test_scsi_cycle_fallback() {
        let doc = json!({
            "scsi_start_stop_cycle_counter": { "accumulated_start_stop_cycles": 41 }
        });
        let points = run(&PowerExtractor, &doc);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 41.0);
    }

    #[test]
    fn test_unusable_power_on_time_is_skipped() {
        for doc in [
            json!({ "power_on_time": { "hours": "lots" } }),
            json!({ "power_on_time": {} }),
            json!({ "power_on_time": { "hours": 5, "minutes": [1] } }),
        ] {
            assert!(run(&PowerExtractor, &doc).is_empty(), "{}", doc);
        }
    }

    #[test]
    fn test_minutes_only() {
        let points = run(&PowerExtractor, &json!({ "power_on_time": { "minutes": 3 } }));
        assert_eq!(find(&points, "smartctl_device_power_on_seconds", &[]).value, 180.0);
    }
}
