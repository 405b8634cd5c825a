// ATA extractor
//
// Reads the ATA/SATA specific sections:
// - `ata_smart_attributes.table` - the vendor attribute table, one point per
//   (attribute, value type)
// - `ata_smart_error_log` / `ata_smart_self_test_log` - log entry counts
// - `ata_sct_erc` - error recovery control timeouts
// - `ata_sct_status` - SCT device state

use serde_json::Value;
use tracing::warn;

use super::{long_flags, number_label, AttributeExtractor, DeviceContext};
use crate::point::DataPoint;

/// Attribute flag booleans, in the order smartctl prints them
const ATTRIBUTE_FLAGS: &[&str] = &[
    "prefailure",
    "updated_online",
    "performance",
    "error_rate",
    "event_count",
    "auto_keep",
];

/// `attribute_value_type` label and the path of that value inside a table row
const ATTRIBUTE_VALUES: &[(&str, &str)] = &[
    ("value", "value"),
    ("worst", "worst"),
    ("thresh", "thresh"),
    ("raw", "raw.value"),
];

pub struct AtaExtractor;

impl AtaExtractor {
    fn attribute(device: &DeviceContext<'_>, index: usize, row: &Value) -> Vec<DataPoint> {
        if !row.is_object() {
            warn!(device = device.label(), index, "Skipping ATA attribute that is not an object");
            return Vec::new();
        }

        let Some(id) = row.get("id").and_then(number_label) else {
            warn!(device = device.label(), index, "Skipping ATA attribute without an id");
            return Vec::new();
        };

        let name = device
            .string_in(row, "name")
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());

        let flags_short = device
            .string_in(row, "flags.string")
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let flags_long = long_flags(row.get("flags"), ATTRIBUTE_FLAGS);

        let labelled = |value_type: &str, value: f64| {
            device
                .gauge("device", "attribute", value)
                .with_label("attribute_id", id.as_str())
                .with_label("attribute_name", name.as_str())
                .with_label("attribute_flags_short", flags_short.as_str())
                .with_label("attribute_flags_long", flags_long.as_str())
                .with_label("attribute_value_type", value_type)
        };

        let mut points: Vec<DataPoint> = ATTRIBUTE_VALUES
            .iter()
            .filter_map(|(value_type, path)| {
                device
                    .number_in(row, path)
                    .map(|value| labelled(*value_type, value))
            })
            .collect();

        // "" while healthy, "now" or "past" once the threshold was crossed
        if let Some(when_failed) = device.string_in(row, "when_failed") {
            let failing = if when_failed.trim().is_empty() { 0.0 } else { 1.0 };
            points.push(labelled("failing", failing));
        }

        points
    }

    /// `<section>.<log type>.<field>` for every log type present
    fn log_counts(
        device: &DeviceContext<'_>,
        section: &str,
        field: &str,
        metric: &str,
        type_label: &str,
    ) -> Vec<DataPoint> {
        let Some(logs) = device.object(section) else {
            return Vec::new();
        };

        logs.iter()
            .filter_map(|(log_type, log)| {
                let count = device.number_in(log, field)?;
                Some(
                    device
                        .gauge("device", metric, count)
                        .with_label(type_label, log_type.as_str()),
                )
            })
            .collect()
    }
}

impl AttributeExtractor for AtaExtractor {
    fn name(&self) -> &str {
        "ata"
    }

    fn extract(&self, device: &DeviceContext<'_>) -> Vec<DataPoint> {
        let mut points = Vec::new();

        if let Some(table) = device.array("ata_smart_attributes.table") {
            for (index, row) in table.iter().enumerate() {
                points.extend(Self::attribute(device, index, row));
            }
        }

        points.extend(Self::log_counts(
            device,
            "ata_smart_error_log",
            "count",
            "error_log_count",
            "error_log_type",
        ));
        points.extend(Self::log_counts(
            device,
            "ata_smart_self_test_log",
            "count",
            "self_test_log_count",
            "self_test_log_type",
        ));
        points.extend(Self::log_counts(
            device,
            "ata_smart_self_test_log",
            "error_count_total",
            "self_test_log_error_count",
            "self_test_log_type",
        ));

        if let Some(erc) = device.object("ata_sct_erc") {
            for (op_type, setting) in erc {
                if let Some(deciseconds) = device.number_in(setting, "deciseconds") {
                    points.push(
                        device
                            .gauge("device", "erc_seconds", deciseconds / 10.0)
                            .with_label("op_type", op_type.as_str()),
                    );
                }
            }
        }

        if let Some(state) = device.number("ata_sct_status.device_state.value") {
            points.push(device.gauge("device", "state", state));
        }

        points
    }
}
