// Document module - best-effort path lookups into a parsed smartctl JSON tree
//
// smartctl's JSON output changes shape with the device protocol and the
// vendor. Nothing here fails on a missing key: every read reports whether
// the value was absent, of an unexpected type, or present.

use serde_json::Value;

/// Outcome of a typed read from the document
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// The path does not exist (or holds `null`)
    Absent,

    /// The path exists but holds a value of another JSON type.
    /// Carries the name of the type actually found.
    Mismatch(&'static str),

    /// The value was found and converted
    Present(T),
}

impl<T> Field<T> {
    /// Converts into an `Option`, dropping the mismatch detail
    pub fn present(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }
}

/// Returns the JSON type name of a value, for log messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolves a dotted path such as `"power_on_time.hours"` or
/// `"ata_smart_attributes.table.0.id"`.
///
/// Numeric segments index into arrays. An empty path returns the root.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }

    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Converts a JSON value into a number.
///
/// Numbers convert directly, booleans become 1/0 and strings are parsed
/// after trimming (smartctl reports some counters as decimal strings).
pub fn as_number(value: &Value) -> Field<f64> {
    match value {
        Value::Null => Field::Absent,
        Value::Number(n) => match n.as_f64() {
            Some(v) => Field::Present(v),
            None => Field::Mismatch("number"),
        },
        Value::Bool(b) => Field::Present(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) => Field::Present(v),
            Err(_) => Field::Mismatch("string"),
        },
        other => Field::Mismatch(type_name(other)),
    }
}

/// Reads a number at `path`
pub fn number(root: &Value, path: &str) -> Field<f64> {
    match lookup(root, path) {
        Some(value) => as_number(value),
        None => Field::Absent,
    }
}

/// Reads a string at `path`. Numbers and booleans are not coerced.
pub fn string<'a>(root: &'a Value, path: &str) -> Field<&'a str> {
    match lookup(root, path) {
        None | Some(Value::Null) => Field::Absent,
        Some(Value::String(s)) => Field::Present(s.as_str()),
        Some(other) => Field::Mismatch(type_name(other)),
    }
}

/// Reads a boolean at `path`
pub fn boolean(root: &Value, path: &str) -> Field<bool> {
    match lookup(root, path) {
        None | Some(Value::Null) => Field::Absent,
        Some(Value::Bool(b)) => Field::Present(*b),
        Some(other) => Field::Mismatch(type_name(other)),
    }
}

/// Reads an array at `path`
pub fn array<'a>(root: &'a Value, path: &str) -> Field<&'a [Value]> {
    match lookup(root, path) {
        None | Some(Value::Null) => Field::Absent,
        Some(Value::Array(items)) => Field::Present(items.as_slice()),
        Some(other) => Field::Mismatch(type_name(other)),
    }
}

/// Reads an object at `path`
pub fn object<'a>(root: &'a Value, path: &str) -> Field<&'a serde_json::Map<String, Value>> {
    match lookup(root, path) {
        None | Some(Value::Null) => Field::Absent,
        Some(Value::Object(map)) => Field::Present(map),
        Some(other) => Field::Mismatch(type_name(other)),
    }
}
