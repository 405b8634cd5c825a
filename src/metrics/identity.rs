// Identity extractor
//
// Emits the `smartctl_device` info metric (value 1, everything interesting
// is in the labels) plus the size and link facts that every device family
// reports: capacity, block sizes, interface speed, rotation rate and the
// smartctl exit status.

use super::{AttributeExtractor, DeviceContext};
use crate::point::DataPoint;

/// Info labels and the JSON path each one is read from
const INFO_LABELS: &[(&str, &str)] = &[
    ("interface", "device.type"),
    ("protocol", "device.protocol"),
    ("serial_number", "serial_number"),
    ("firmware_version", "firmware_version"),
    ("form_factor", "form_factor.name"),
    ("ata_version", "ata_version.string"),
    ("sata_version", "sata_version.string"),
    ("scsi_vendor", "scsi_vendor"),
    ("scsi_product", "scsi_product"),
    ("scsi_revision", "scsi_revision"),
    ("scsi_version", "scsi_version"),
];

pub struct IdentityExtractor;

impl IdentityExtractor {
    /// A trimmed string, or `default` when missing or blank
    fn text<'d>(device: &DeviceContext<'d>, path: &str, default: &'d str) -> &'d str {
        match device.string(path).map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => default,
        }
    }

    fn info(device: &DeviceContext<'_>) -> DataPoint {
        let mut point = device
            .gauge("", "device", 1.0)
            .with_label("model_family", Self::text(device, "model_family", "unknown"))
            .with_label("model_name", Self::text(device, "model_name", "unknown"));

        for (label, path) in INFO_LABELS {
            point = point.with_label(*label, Self::text(device, path, ""));
        }

        point
    }
}

impl AttributeExtractor for IdentityExtractor {
    fn name(&self) -> &str {
        "identity"
    }

    fn extract(&self, device: &DeviceContext<'_>) -> Vec<DataPoint> {
        let mut points = vec![Self::info(device)];

        if let Some(status) = device.number("smartctl.exit_status") {
            points.push(device.gauge("device", "smartctl_exit_status", status));
        }

        // user_capacity is missing for NVMe drives with several namespaces
        if let Some(blocks) = device.number("user_capacity.blocks") {
            points.push(device.gauge("device", "capacity_blocks", blocks));
        }
        if let Some(bytes) = device.number("user_capacity.bytes") {
            points.push(device.gauge("device", "capacity_bytes", bytes));
        }
        if let Some(bytes) = device.number("nvme_total_capacity") {
            points.push(device.gauge("device", "nvme_capacity_bytes", bytes));
        }

        for blocks_type in ["logical", "physical"] {
            let path = format!("{}_block_size", blocks_type);
            if let Some(size) = device.number(&path) {
                points.push(
                    device
                        .gauge("device", "block_size", size)
                        .with_label("blocks_type", blocks_type),
                );
            }
        }

        for speed_type in ["max", "current"] {
            let units = device.number(&format!("interface_speed.{}.units_per_second", speed_type));
            let bits = device.number(&format!("interface_speed.{}.bits_per_unit", speed_type));
            if let (Some(units), Some(bits)) = (units, bits) {
                points.push(
                    device
                        .gauge("device", "interface_speed", units * bits)
                        .with_label("speed_type", speed_type),
                );
            }
        }

        // 0 means solid state
        if let Some(rate) = device.number("rotation_rate").filter(|r| *r > 0.0) {
            points.push(device.gauge("device", "rotation_rate", rate));
        }

        points
    }
}
