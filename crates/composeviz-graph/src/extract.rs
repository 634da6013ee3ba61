//! Locates the service, volume, and network maps of a decoded document.
//!
//! Legacy (version 1) documents have no top-level keys besides services,
//! so the document itself is the service map. Versioned documents nest
//! each map under its own key.

use serde_yaml::{Mapping, Value};

/// Returns the service definitions of a document.
pub fn services(doc: &Value) -> Mapping {
    if is_legacy(doc) {
        return doc.as_mapping().cloned().unwrap_or_default();
    }
    section(doc, "services")
}

/// Returns the named volume definitions of a document.
pub fn volumes(doc: &Value) -> Mapping {
    if is_legacy(doc) {
        return Mapping::new();
    }
    section(doc, "volumes")
}

/// Returns the network definitions of a document.
pub fn networks(doc: &Value) -> Mapping {
    if is_legacy(doc) {
        return Mapping::new();
    }
    section(doc, "networks")
}

fn section(doc: &Value, key: &str) -> Mapping {
    doc.get(key)
        .and_then(Value::as_mapping)
        .cloned()
        .unwrap_or_default()
}

fn is_legacy(doc: &Value) -> bool {
    match doc.get("version") {
        None | Some(Value::Null) => true,
        Some(version) => coerce_int(version) == 1,
    }
}

/// Loose integer coercion: numbers truncate, strings read their leading
/// integer, anything else is 0.
#[allow(clippy::cast_possible_truncation)]
fn coerce_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or_default(),
        Value::String(s) => {
            let s = s.trim();
            let (sign, digits) = s
                .strip_prefix('-')
                .map_or((1, s), |rest| (-1, rest));
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse::<i64>().map_or(0, |n| sign * n)
        }
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}
