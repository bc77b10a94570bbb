//! Structural validation of documents against a compiled [`Schema`]
//!
//! The engine is a pure reporting function: it walks the document
//! depth-first in schema declaration order and returns every violation it
//! finds. It never fails and keeps no state between calls.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{ArrayShape, JsonType, ObjectShape, Schema, SchemaNode, Shape};

/// One violated constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Accessor from the document root, e.g. `knowledge.topics[0]`
    pub path: String,
    pub message: String,
}

impl Violation {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate `data` against `schema`, rooting every path at `root`.
///
/// The root is always treated as an object: a document that is not an
/// object has no fields, so each root `required` name is reported missing.
pub fn validate(schema: &Schema, data: &Value, root: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    match data.as_object() {
        Some(fields) => check_object(&schema.root, fields, root, &mut violations),
        None => check_required(&schema.root, None, root, &mut violations),
    }
    violations
}

fn check_object(
    shape: &ObjectShape,
    fields: &Map<String, Value>,
    path: &str,
    out: &mut Vec<Violation>,
) {
    check_required(shape, Some(fields), path, out);

    for property in &shape.properties {
        // Absence is only ever reported by the presence check
        let Some(value) = fields.get(&property.name) else {
            continue;
        };
        check_value(&property.node, value, &format!("{path}.{}", property.name), out);
    }
}

fn check_required(
    shape: &ObjectShape,
    fields: Option<&Map<String, Value>>,
    path: &str,
    out: &mut Vec<Violation>,
) {
    for name in &shape.required {
        let present = fields
            .and_then(|f| f.get(name))
            .map(|v| !v.is_null())
            .unwrap_or(false);
        if !present {
            out.push(Violation::new(format!("{path}.{name}"), "required field missing"));
        }
    }
}

fn check_value(node: &SchemaNode, value: &Value, path: &str, out: &mut Vec<Violation>) {
    if let Some(declared) = &node.declared {
        if !declared.accepts(value) {
            out.push(Violation::new(
                path,
                format!("expected {declared}, got {}", JsonType::of(value)),
            ));
            return;
        }
    }

    if let Some(allowed) = &node.allowed {
        if !allowed.iter().any(|candidate| literal_eq(candidate, value)) {
            let listed: Vec<String> = allowed.iter().map(render_member).collect();
            out.push(Violation::new(
                path,
                format!("must be one of [{}], got \"{}\"", listed.join(", "), render_literal(value)),
            ));
        }
    }

    match value {
        Value::String(text) => {
            if let Some(pattern) = &node.pattern {
                if !pattern.is_match(text) {
                    out.push(Violation::new(path, format!("does not match pattern {pattern}")));
                }
            }
            // A zero limit counts as unset
            if let Some(limit) = node.max_length.filter(|&limit| limit > 0) {
                if utf16_len(text) > limit {
                    out.push(Violation::new(path, format!("exceeds max length {limit}")));
                }
            }
        }
        Value::Number(n) => {
            let n = n.as_f64().unwrap_or(f64::NAN);
            if let Some(min) = node.minimum {
                if n < min {
                    out.push(Violation::new(
                        path,
                        format!("must be >= {}, got {}", render_number(min), render_literal(value)),
                    ));
                }
            }
            if let Some(max) = node.maximum {
                if n > max {
                    out.push(Violation::new(
                        path,
                        format!("must be <= {}, got {}", render_number(max), render_literal(value)),
                    ));
                }
            }
        }
        _ => {}
    }

    match (&node.shape, value) {
        (Shape::Object(shape), Value::Object(fields)) => check_object(shape, fields, path, out),
        (Shape::Array(shape), Value::Array(elements)) => check_array(shape, elements, path, out),
        _ => {}
    }
}

fn check_array(shape: &ArrayShape, elements: &[Value], path: &str, out: &mut Vec<Violation>) {
    if let Some(min) = shape.min_items {
        if (elements.len() as u64) < min {
            out.push(Violation::new(
                path,
                format!("needs at least {min} items, got {}", elements.len()),
            ));
        }
    }

    let Some(items) = &shape.items else {
        return;
    };

    if let Some(object) = &items.object {
        for (i, element) in elements.iter().enumerate() {
            // Non-object elements are not checked for presence
            if let Some(fields) = element.as_object() {
                check_object(object, fields, &format!("{path}[{i}]"), out);
            }
        }
    }

    if let Some(pattern) = &items.pattern {
        for (i, element) in elements.iter().enumerate() {
            if let Some(text) = element.as_str() {
                if !pattern.is_match(text) {
                    out.push(Violation::new(
                        format!("{path}[{i}]"),
                        format!("does not match pattern {pattern}"),
                    ));
                }
            }
        }
    }
}

/// Value equality where numbers compare numerically (`1 == 1.0`)
fn literal_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// String length in UTF-16 code units
fn utf16_len(text: &str) -> u64 {
    text.encode_utf16().count() as u64
}

/// Render a value the way a JavaScript template literal would: strings
/// bare, numbers without a trailing `.0`, arrays comma-joined, objects as
/// `[object Object]`.
fn render_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        Value::Number(n) => render_number(n.as_f64().unwrap_or(f64::NAN)),
        Value::Array(items) => items.iter().map(render_member).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    }
}

/// Render an element of a joined list, where `null` becomes empty
fn render_member(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => render_literal(other),
    }
}

fn render_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}
