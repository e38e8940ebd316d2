// src/validation/subset.rs

use serde_json::{Map, Number, Value};

/// True when every field of `expected` is present in `actual` with an
/// equivalent value. Keys and text compare case-insensitively, extra keys in
/// `actual` are ignored, sequences must match element by element.
pub fn is_subset(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(small), Value::Object(big)) => {
            let big = fold_keys(big);
            small.iter().all(|(key, value)| {
                big.get(fold(key).as_str())
                    .is_some_and(|candidate| is_subset(value, candidate))
            })
        }
        (Value::Array(small), Value::Array(big)) => {
            small.len() == big.len() && small.iter().zip(big).all(|(a, b)| is_subset(a, b))
        }
        (Value::String(a), Value::String(b)) => fold(a) == fold(b),
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// One place where `actual` fails to cover `expected`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldMismatch {
    MissingKey { path: String },
    Value { path: String, expected: Value, actual: Value },
    Length { path: String, expected: usize, actual: usize },
}

impl FieldMismatch {
    pub fn path(&self) -> &str {
        match self {
            FieldMismatch::MissingKey { path }
            | FieldMismatch::Value { path, .. }
            | FieldMismatch::Length { path, .. } => path,
        }
    }

    /// Short human-readable description, for reports.
    pub fn hint(&self) -> String {
        match self {
            FieldMismatch::MissingKey { path } => format!("{path}: missing from reply"),
            FieldMismatch::Value { path, expected, actual } => {
                format!("{path}: expected {expected}, got {actual}")
            }
            FieldMismatch::Length { path, expected, actual } => {
                format!("{path}: expected {expected} items, got {actual}")
            }
        }
    }
}

/// Lists every leaf where `is_subset` would fail. Empty iff `is_subset` holds.
pub fn mismatches(expected: &Value, actual: &Value) -> Vec<FieldMismatch> {
    let mut out = Vec::new();
    collect(expected, actual, "", &mut out);
    out
}

fn collect(expected: &Value, actual: &Value, path: &str, out: &mut Vec<FieldMismatch>) {
    match (expected, actual) {
        (Value::Object(small), Value::Object(big)) => {
            let big = fold_keys(big);
            for (key, value) in small {
                let child = join(path, key);
                match big.get(fold(key).as_str()) {
                    Some(candidate) => collect(value, candidate, &child, out),
                    None => out.push(FieldMismatch::MissingKey { path: child }),
                }
            }
        }
        (Value::Array(small), Value::Array(big)) if small.len() != big.len() => {
            out.push(FieldMismatch::Length {
                path: path.to_string(),
                expected: small.len(),
                actual: big.len(),
            });
        }
        (Value::Array(small), Value::Array(big)) => {
            for (i, (a, b)) in small.iter().zip(big).enumerate() {
                collect(a, b, &format!("{path}[{i}]"), out);
            }
        }
        _ if is_subset(expected, actual) => {}
        _ => out.push(FieldMismatch::Value {
            path: path.to_string(),
            expected: expected.clone(),
            actual: actual.clone(),
        }),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn fold(s: &str) -> String {
    s.to_lowercase()
}

// Later duplicates win, matching how a mapping literal with repeated keys reads.
fn fold_keys(map: &Map<String, Value>) -> std::collections::HashMap<String, &Value> {
    map.iter().map(|(k, v)| (fold(k), v)).collect()
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
