// Temperature extractor
//
// smartctl puts every temperature it knows about into one flat object:
// `current`, `drive_trip`, `lifetime_max`, `op_limit_max`, ... Each key
// becomes the `temperature_type` label.

use super::{AttributeExtractor, DeviceContext};
use crate::point::DataPoint;

pub struct TemperatureExtractor;

impl AttributeExtractor for TemperatureExtractor {
    fn name(&self) -> &str {
        "temperature"
    }

    fn extract(&self, device: &DeviceContext<'_>) -> Vec<DataPoint> {
        let Some(temperatures) = device.object("temperature") else {
            return Vec::new();
        };

        temperatures
            .iter()
            .filter_map(|(kind, value)| {
                let celsius = device.number_in(value, "")?;
                Some(
                    device
                        .gauge("device", "temperature", celsius)
                        .with_label("temperature_type", kind.as_str()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{find, run};
    use serde_json::json;

    #[test]
    fn test_every_sensor_is_reported() {
        let doc = json!({ "temperature": { "current": 36, "drive_trip": 70, "lifetime_max": 52 } });
        let points = run(&TemperatureExtractor, &doc);

        assert_eq!(points.len(), 3);
        let trip = find(&points, "smartctl_device_temperature", &[("temperature_type", "drive_trip")]);
        assert_eq!(trip.value, 70.0);
    }

    #[test]
    fn test_bad_sensor_does_not_hide_others() {
        let doc = json!({ "temperature": { "current": 36, "broken": { "nested": 1 } } });
        let points = run(&TemperatureExtractor, &doc);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].labels["temperature_type"], "current");
    }

    #[test]
    fn test_no_temperature_block() {
        assert!(run(&TemperatureExtractor, &json!({ "temperature": 5 })).is_empty());
        assert!(run(&TemperatureExtractor, &json!({})).is_empty());
    }
}
