// Status module - interprets smartctl's own diagnostics
//
// smartctl's exit status is a bit mask, and its JSON output carries a
// `smartctl.messages` list. Neither stops collection: whatever the document
// contains is still exported. They are only logged.

use serde_json::Value;
use tracing::{debug, warn};

use crate::document::{self, Field};

/// Meaning of each smartctl exit status bit, lowest bit first
const EXIT_STATUS_BITS: [&str; 8] = [
    "command line did not parse",
    "device open failed",
    "SMART or ATA command to the disk failed",
    "SMART status check returned DISK FAILING",
    "prefail attributes found at or below threshold",
    "usage or prefail attributes were at or below threshold in the past",
    "device error log contains records of errors",
    "device self-test log contains records of errors",
];

/// Bits 0-2 mean smartctl could not read the device at all
const FATAL_BITS: u8 = 0b0000_0111;

/// Returns a description for every bit set in `status`
pub fn decode_exit_status(status: u8) -> Vec<&'static str> {
    EXIT_STATUS_BITS
        .iter()
        .enumerate()
        .filter(|(bit, _)| status & (1 << bit) != 0)
        .map(|(_, meaning)| *meaning)
        .collect()
}

/// True when the exit status says the device data could not be read
pub fn is_read_failure(status: u8) -> bool {
    status & FATAL_BITS != 0
}

/// Logs the exit status bits and error messages carried by a document
pub fn log_diagnostics(document: &Value, device: &str) {
    match document::number(document, "smartctl.exit_status") {
        Field::Present(status) if (0.0..=255.0).contains(&status) => {
            let status = status as u8;
            for meaning in decode_exit_status(status) {
                if is_read_failure(status) {
                    warn!(device, status, "smartctl reported: {}", meaning);
                } else {
                    debug!(device, status, "smartctl reported: {}", meaning);
                }
            }
        }
        Field::Present(status) => warn!(device, status, "smartctl exit status out of range"),
        Field::Mismatch(found) => warn!(device, found, "smartctl exit status has unexpected JSON type"),
        Field::Absent => {}
    }

    if let Field::Present(messages) = document::array(document, "smartctl.messages") {
        for message in messages {
            let severity = document::string(message, "severity").present().unwrap_or("information");
            let text = document::string(message, "string").present().unwrap_or("");
            if severity == "error" {
                warn!(device, "smartctl error: {}", text);
            } else {
                debug!(device, severity, "smartctl message: {}", text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_exit_status() {
        assert!(decode_exit_status(0).is_empty());
        assert_eq!(decode_exit_status(2), vec!["device open failed"]);
        assert_eq!(
            decode_exit_status(0b1100_0000),
            vec![
                "device error log contains records of errors",
                "device self-test log contains records of errors"
            ]
        );
    }

    #[test]
    fn test_read_failure_bits() {
        assert!(is_read_failure(1));
        assert!(is_read_failure(4));
        assert!(!is_read_failure(8));
        assert!(!is_read_failure(64));
    }

    #[test]
    fn test_log_diagnostics_tolerates_odd_shapes() {
        log_diagnostics(&json!({}), "sda");
        log_diagnostics(&json!({ "smartctl": { "exit_status": "x", "messages": 5 } }), "sda");
        log_diagnostics(
            &json!({ "smartctl": { "exit_status": 1000, "messages": [
                { "string": "Smartctl open device: /dev/sdz failed", "severity": "error" },
                "not an object"
            ] } }),
            "sdz",
        );
    }
}
