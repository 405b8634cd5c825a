// Device label builder
//
// Turns smartctl's `device.name` / `device.type` pair into the value of the
// `device` metric label. Devices behind RAID/SAS controllers share a path
// (e.g. every disk behind a MegaRAID card is `/dev/bus/0`), so the
// controller addressing in the type string must become part of the label.

/// Path prefixes that carry no identity of their own.
/// Longest first, so `/dev/disk/by-id/` wins over `/dev/`.
///
/// What remains after the prefix is kept as readable as possible: `-`, `.`
/// and `:` survive sanitizing because by-id and by-path names are built
/// from them (`ata-CT500MX500SSD1_...`, `pci-0000:00:1f.2-ata-1`).
const GENERIC_PREFIXES: &[&str] = &["/dev/disk/by-id/", "/dev/disk/by-path/", "/dev/"];

/// Builds the `device` label value from a device path and smartctl device type.
///
/// The leading `/dev/` (or `/dev/disk/by-id/`, `/dev/disk/by-path/`) is
/// dropped and the remaining path separators become `_`. When the type
/// carries controller addressing (it contains a comma, e.g. `megaraid,1`),
/// the type is appended with its commas turned into `_`. Plain types such
/// as `auto`, `sat` or `nvme` add nothing, so the same disk gets the same
/// label no matter how it was queried. Appending them would split one disk
/// into `sda`, `sda_sat` and `sda_auto` depending on the `-d` option, while
/// a comma-free type never tells two disks on one path apart.
///
/// # Examples
/// ```
/// use smartctl_collector::label::build_device_label;
///
/// assert_eq!(build_device_label("/dev/bus/0", "megaraid,1"), "bus_0_megaraid_1");
/// assert_eq!(build_device_label("/dev/sda", "auto"), "sda");
/// ```
pub fn build_device_label(device_path: &str, device_type: &str) -> String {
    let trimmed = GENERIC_PREFIXES
        .iter()
        .find_map(|prefix| device_path.strip_prefix(prefix))
        .unwrap_or(device_path);

    let path_part = trimmed
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    let mut label = if path_part.is_empty() {
        "unknown".to_string()
    } else {
        path_part
    };

    let device_type = device_type.trim();
    if device_type.contains(',') {
        label.push('_');
        label.push_str(&device_type.replace(',', "_"));
    }

    sanitize(&label)
}

/// Collapses every run of characters outside `[A-Za-z0-9_.:-]` into one `_`
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }

    out
}
