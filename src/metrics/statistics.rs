// Statistics extractor
//
// Vendor/protocol statistics tables that come on top of the attribute table:
// the ATA Device Statistics log (GP log 0x04, grouped in pages) and the SATA
// PHY event counters. Both land in `smartctl_device_statistics`, keyed by
// table and statistic name.

use serde_json::Value;
use tracing::{debug, warn};

use super::{long_flags, number_label, AttributeExtractor, DeviceContext};
use crate::point::DataPoint;

const STATISTIC_FLAGS: &[&str] = &["valid", "normalized", "supports_dsn", "monitored_condition_met"];

const PHY_TABLE: &str = "SATA PHY Event Counters";

pub struct StatisticsExtractor;

impl StatisticsExtractor {
    fn point(
        device: &DeviceContext<'_>,
        value: f64,
        table: &str,
        name: &str,
        flags_short: &str,
        flags_long: &str,
    ) -> DataPoint {
        device
            .gauge("device", "statistics", value)
            .with_label("statistics_table", table)
            .with_label("statistics_name", name)
            .with_label("statistics_flags_short", flags_short)
            .with_label("statistics_flags_long", flags_long)
    }

    /// Name of a table row, falling back to `<prefix>_<key>` when unnamed
    fn row_name(device: &DeviceContext<'_>, row: &Value, key: &str, prefix: &str) -> Option<String> {
        if let Some(name) = device.string_in(row, "name").map(str::trim).filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        row.get(key)
            .and_then(number_label)
            .map(|k| format!("{}_{}", prefix, k))
    }

    fn device_statistics(device: &DeviceContext<'_>) -> Vec<DataPoint> {
        let mut points = Vec::new();
        let Some(pages) = device.array("ata_device_statistics.pages") else {
            return points;
        };

        for (page_index, page) in pages.iter().enumerate() {
            let table = Self::row_name(device, page, "number", "page")
                .unwrap_or_else(|| format!("page_{}", page_index));

            let Some(rows) = device.array_in(page, "table") else {
                continue;
            };

            for row in rows {
                // Statistics the drive does not maintain are flagged invalid
                if device.boolean_in(row, "flags.valid") == Some(false) {
                    continue;
                }
                let Some(value) = device.number_in(row, "value") else {
                    continue;
                };
                let Some(name) = Self::row_name(device, row, "offset", "offset") else {
                    warn!(device = device.label(), table = table.as_str(), "Skipping unnamed statistic");
                    continue;
                };

                let flags_short = device
                    .string_in(row, "flags.string")
                    .map(str::trim)
                    .unwrap_or_default();
                let flags_long = long_flags(row.get("flags"), STATISTIC_FLAGS);

                points.push(Self::point(device, value, &table, &name, flags_short, &flags_long));
            }
        }

        points
    }

    fn phy_event_counters(device: &DeviceContext<'_>) -> Vec<DataPoint> {
        let Some(rows) = device.array("sata_phy_event_counters.table") else {
            return Vec::new();
        };

        rows.iter()
            .filter_map(|row| {
                let value = device.number_in(row, "value")?;
                let Some(name) = Self::row_name(device, row, "id", "id") else {
                    debug!(device = device.label(), "Skipping PHY event counter without name or id");
                    return None;
                };
                Some(Self::point(device, value, PHY_TABLE, &name, "V---", "valid"))
            })
            .collect()
    }
}

impl AttributeExtractor for StatisticsExtractor {
    fn name(&self) -> &str {
        "statistics"
    }

    fn extract(&self, device: &DeviceContext<'_>) -> Vec<DataPoint> {
        let mut points = Self::device_statistics(device);
        points.extend(Self::phy_event_counters(device));
        points
    }
}
