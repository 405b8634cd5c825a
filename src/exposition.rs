// Exposition module - renders data points as text lines
//
// Line format: `metric_name{label1="v1",label2="v2"} value`
// Labels are sorted by key, values are the shortest decimal that reads back
// to the same f64. `parse_line` inverts `format_line`.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::point::DataPoint;

/// Errors from `parse_line`
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("unterminated label set in: {0}")]
    UnterminatedLabels(String),

    #[error("malformed label at byte {position}: {line}")]
    MalformedLabel { position: usize, line: String },

    #[error("missing value in: {0}")]
    MissingValue(String),

    #[error("invalid value {value:?} in: {line}")]
    InvalidValue { value: String, line: String },
}

/// A line read back by `parse_line`
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

/// Formats a value: shortest round-trip decimal, `NaN`, `+Inf` or `-Inf`
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "+" } else { "-" };
        format!("{}Inf", sign)
    } else {
        // Display for f64 is already the shortest representation that round-trips
        format!("{}", value)
    }
}

fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Renders one data point as an exposition line (no trailing newline)
pub fn format_line(point: &DataPoint) -> String {
    let value = format_value(point.value);
    if point.labels.is_empty() {
        return format!("{} {}", point.name, value);
    }

    let labels = point
        .labels
        .iter()
        .map(|(key, val)| format!("{}=\"{}\"", key, escape_label_value(val)))
        .collect::<Vec<_>>()
        .join(",");

    format!("{}{{{}}} {}", point.name, labels, value)
}

/// Renders points as sorted lines joined by newlines, with a trailing newline
pub fn render(points: &[DataPoint]) -> String {
    let mut lines: Vec<String> = points.iter().map(format_line).collect();
    lines.sort();

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Parses a line produced by `format_line`
pub fn parse_line(line: &str) -> Result<ParsedLine, ParseError> {
    let line = line.trim_end_matches('\n');
    if line.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let name_end = line.find(['{', ' ']).unwrap_or(line.len());
    let name = line[..name_end].to_string();
    let mut labels = BTreeMap::new();
    let mut rest = &line[name_end..];

    if rest.starts_with('{') {
        let (parsed, consumed) = parse_labels(line, name_end)?;
        labels = parsed;
        rest = &line[consumed..];
    }

    let raw_value = rest
        .strip_prefix(' ')
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ParseError::MissingValue(line.to_string()))?;

    let value = match raw_value {
        "NaN" => f64::NAN,
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        other => other.parse::<f64>().map_err(|_| ParseError::InvalidValue {
            value: other.to_string(),
            line: line.to_string(),
        })?,
    };

    Ok(ParsedLine { name, labels, value })
}

/// Parses `{k="v",...}` starting at `start` (the `{`).
/// Returns the labels and the byte offset just past the closing `}`.
fn parse_labels(line: &str, start: usize) -> Result<(BTreeMap<String, String>, usize), ParseError> {
    let malformed = |position: usize| ParseError::MalformedLabel {
        position,
        line: line.to_string(),
    };

    let bytes = line.as_bytes();
    let mut labels = BTreeMap::new();
    let mut pos = start + 1;

    loop {
        match bytes.get(pos) {
            None => return Err(ParseError::UnterminatedLabels(line.to_string())),
            Some(b'}') => return Ok((labels, pos + 1)),
            Some(_) => {}
        }

        let eq = line[pos..].find('=').map(|i| pos + i).ok_or_else(|| malformed(pos))?;
        let key = line[pos..eq].to_string();
        if key.is_empty() || bytes.get(eq + 1) != Some(&b'"') {
            return Err(malformed(pos));
        }

        let mut value = String::new();
        let mut chars = line[eq + 2..].char_indices();
        let mut closed_at = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, escaped)) => value.push(escaped),
                    None => break,
                },
                '"' => {
                    closed_at = Some(eq + 2 + i);
                    break;
                }
                other => value.push(other),
            }
        }
        let closed_at = closed_at.ok_or_else(|| ParseError::UnterminatedLabels(line.to_string()))?;
        labels.insert(key, value);

        pos = closed_at + 1;
        match bytes.get(pos) {
            Some(b',') => pos += 1,
            Some(b'}') => {}
            None => return Err(ParseError::UnterminatedLabels(line.to_string())),
            Some(_) => return Err(malformed(pos)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::ValueKind;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(5.0), "5");
        assert_eq!(format_value(0.1), "0.1");
        assert_eq!(format_value(-2.5), "-2.5");
        assert_eq!(format_value(4000787030016.0), "4000787030016");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn test_format_line_sorts_and_escapes() {
        let point = DataPoint::new("smartctl_device", ValueKind::Gauge, 1.0)
            .with_label("model_name", "Quote \"Q\" \\ Back")
            .with_label("device", "sda");

        assert_eq!(
            format_line(&point),
            r#"smartctl_device{device="sda",model_name="Quote \"Q\" \\ Back"} 1"#
        );
        assert_eq!(
            format_line(&DataPoint::new("smartctl_up", ValueKind::Untyped, 0.0)),
            "smartctl_up 0"
        );
    }

    #[test]
    fn test_round_trip() {
        let points = vec![
            DataPoint::new("smartctl_device_attribute", ValueKind::Gauge, 123456789.125)
                .with_label("attribute_name", "Line\nBreak, \"quoted\" {braces}")
                .with_label("device", "bus_0_megaraid_1")
                .with_label("empty", ""),
            DataPoint::new("smartctl_device_bytes_read", ValueKind::Counter, 1e-7),
            DataPoint::new("smartctl_nan", ValueKind::Untyped, f64::NEG_INFINITY)
                .with_label("k", "v"),
        ];

        for point in &points {
            let parsed = parse_line(&format_line(point)).unwrap();
            assert_eq!(parsed.name, point.name);
            assert_eq!(parsed.labels, point.labels);
            assert_eq!(parsed.value, point.value);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_line(""), Err(ParseError::Empty));
        assert!(matches!(parse_line("m{a=\"b 1"), Err(ParseError::UnterminatedLabels(_))));
        assert!(matches!(parse_line("m{a=b} 1"), Err(ParseError::MalformedLabel { .. })));
        assert!(matches!(parse_line("m{a=\"b\"}"), Err(ParseError::MissingValue(_))));
        assert!(matches!(parse_line("m one"), Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn test_render_is_sorted_with_trailing_newline() {
        let points = vec![
            DataPoint::new("b", ValueKind::Gauge, 2.0),
            DataPoint::new("a", ValueKind::Gauge, 1.0),
        ];
        assert_eq!(render(&points), "a 1\nb 2\n");
    }
}
