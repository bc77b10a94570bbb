//! Compiled schema model
//!
//! Raw schema documents are compiled once into a typed tree. Every node is
//! tagged with its structural [`Shape`], which is derived from the declared
//! `type`: only a node declaring exactly `"object"` carries an object shape,
//! and only a node declaring exactly `"array"` carries an array shape. The
//! validator recurses through shapes alone, so a value that fails its type
//! check can never be walked into.
//!
//! Supported keywords: `type`, `required`, `properties`, `enum`, `pattern`,
//! `minimum`, `maximum`, `maxLength`, `minItems`, `items`. Everything else
//! (`$schema`, `$id`, `title`, `description`, `format`, ...) is ignored.

use std::fmt;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{OakError, Result};

// =============================================================================
// JSON Types
// =============================================================================

/// A type name usable in a `type` keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::Null => "null",
        }
    }

    /// Runtime kind of a value. Never returns [`JsonType::Integer`]:
    /// integers are numbers that happen to have no fractional part.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Whether `value` satisfies this declared type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Integer => value
                .as_f64()
                .map(|n| n.is_finite() && n.fract() == 0.0)
                .unwrap_or(false),
            other => *other == Self::of(value),
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The `type` keyword as written: one name or a list of names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    Single(JsonType),
    Union(Vec<JsonType>),
}

impl DeclaredType {
    pub fn types(&self) -> &[JsonType] {
        match self {
            Self::Single(t) => std::slice::from_ref(t),
            Self::Union(ts) => ts,
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.types().iter().any(|t| t.accepts(value))
    }

    /// True only for the single-name form, e.g. `"object"` but not `["object"]`
    pub fn is_exactly(&self, json_type: JsonType) -> bool {
        matches!(self, Self::Single(t) if *t == json_type)
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.types().iter().map(|t| t.name()).collect();
        f.write_str(&names.join("|"))
    }
}

// =============================================================================
// Patterns
// =============================================================================

/// A compiled `pattern` keyword, keeping its source for messages
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(&ecma_classes(source))?,
        })
    }

    /// Unanchored search, like ECMAScript `RegExp.prototype.test`
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Rewrite ECMAScript class escapes into their ASCII-only `regex` forms.
///
/// Without the `u` flag, ECMAScript `\d`, `\w` and `\b` only know ASCII,
/// while the `regex` crate makes them Unicode-aware. Inside a bracket class
/// `[` and the set operators `&&`/`~~` are literals, so they are escaped.
fn ecma_classes(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_class = false;
    let mut chars = source.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(escaped) = chars.next() else {
                    out.push('\\');
                    break;
                };
                let replacement = match (escaped, in_class) {
                    ('d', false) => "[0-9]",
                    ('D', false) => "[^0-9]",
                    ('w', false) => "[0-9A-Za-z_]",
                    ('W', false) => "[^0-9A-Za-z_]",
                    ('b', false) => "(?-u:\\b)",
                    ('B', false) => "(?-u:\\B)",
                    ('d', true) => "0-9",
                    ('D', true) => "[^0-9]",
                    ('w', true) => "0-9A-Za-z_",
                    ('W', true) => "[^0-9A-Za-z_]",
                    // Backspace inside a class
                    ('b', true) => "\\x08",
                    _ => {
                        out.push('\\');
                        out.push(escaped);
                        continue;
                    }
                };
                out.push_str(replacement);
            }
            '[' if in_class => out.push_str("\\["),
            '&' | '~' if in_class => {
                out.push('\\');
                out.push(c);
            }
            '[' => {
                in_class = true;
                out.push(c);
                // Negation belongs to the opener
                if chars.as_str().starts_with('^') {
                    out.push('^');
                    chars.next();
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// Schema Nodes
// =============================================================================

/// Constraints for an object value
#[derive(Debug, Clone, Default)]
pub struct ObjectShape {
    /// Names that must be present and non-null
    pub required: Vec<String>,
    /// Declared properties, in schema order
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub node: SchemaNode,
}

/// Constraints for an array value
#[derive(Debug, Clone, Default)]
pub struct ArrayShape {
    pub min_items: Option<u64>,
    pub items: Option<ItemRule>,
}

/// What the `items` keyword contributes
#[derive(Debug, Clone, Default)]
pub struct ItemRule {
    /// Present when `items.type` is exactly `"object"`
    pub object: Option<ObjectShape>,
    /// Applied to every string element
    pub pattern: Option<Pattern>,
}

/// Structural shape of a node, derived from its declared type
#[derive(Debug, Clone, Default)]
pub enum Shape {
    Object(ObjectShape),
    Array(ArrayShape),
    #[default]
    Scalar,
}

/// Compiled constraints for one value position
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    pub declared: Option<DeclaredType>,
    pub allowed: Option<Vec<Value>>,
    pub pattern: Option<Pattern>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub max_length: Option<u64>,
    pub shape: Shape,
}

/// A compiled schema document
#[derive(Debug, Clone)]
pub struct Schema {
    /// Optional `title` of the schema document
    pub title: Option<String>,
    /// The document root. Its `required`/`properties` always apply,
    /// whatever type the root declares.
    pub root: ObjectShape,
}

impl Schema {
    /// Compile a raw schema document
    pub fn compile(raw: &Value) -> Result<Self> {
        let obj = as_object(raw, "#")?;
        Ok(Self {
            title: obj.get("title").and_then(Value::as_str).map(String::from),
            root: compile_object(obj, "#")?,
        })
    }

    /// Parse and compile a schema from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)?;
        Self::compile(&raw)
    }
}

fn as_object<'a>(raw: &'a Value, at: &str) -> Result<&'a Map<String, Value>> {
    raw.as_object()
        .ok_or_else(|| OakError::invalid_schema(at, "schema node must be an object"))
}

fn compile_node(raw: &Value, at: &str) -> Result<SchemaNode> {
    let obj = as_object(raw, at)?;

    let declared = obj
        .get("type")
        .map(|t| compile_type(t, &format!("{at}/type")))
        .transpose()?;

    let allowed = match obj.get("enum") {
        Some(Value::Array(values)) => Some(values.clone()),
        Some(_) => return Err(OakError::invalid_schema(&format!("{at}/enum"), "enum must be an array")),
        None => None,
    };

    let shape = match &declared {
        Some(d) if d.is_exactly(JsonType::Object) => Shape::Object(compile_object(obj, at)?),
        Some(d) if d.is_exactly(JsonType::Array) => Shape::Array(compile_array(obj, at)?),
        _ => Shape::Scalar,
    };

    Ok(SchemaNode {
        declared,
        allowed,
        pattern: compile_pattern(obj, at)?,
        minimum: number_keyword(obj, "minimum", at)?,
        maximum: number_keyword(obj, "maximum", at)?,
        max_length: count_keyword(obj, "maxLength", at)?,
        shape,
    })
}

fn compile_type(raw: &Value, at: &str) -> Result<DeclaredType> {
    let lookup = |name: &str| {
        JsonType::from_name(name)
            .ok_or_else(|| OakError::invalid_schema(at, format!("unknown type '{name}'")))
    };
    match raw {
        Value::String(name) => Ok(DeclaredType::Single(lookup(name.as_str())?)),
        Value::Array(names) => {
            let types = names
                .iter()
                .map(|n| {
                    n.as_str()
                        .ok_or_else(|| OakError::invalid_schema(at, "type names must be strings"))
                        .and_then(lookup)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(DeclaredType::Union(types))
        }
        _ => Err(OakError::invalid_schema(at, "type must be a string or an array of strings")),
    }
}

fn compile_object(obj: &Map<String, Value>, at: &str) -> Result<ObjectShape> {
    let required = match obj.get("required") {
        None => Vec::new(),
        Some(Value::Array(names)) => names
            .iter()
            .map(|n| {
                n.as_str().map(String::from).ok_or_else(|| {
                    OakError::invalid_schema(&format!("{at}/required"), "required entries must be strings")
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => {
            return Err(OakError::invalid_schema(&format!("{at}/required"), "required must be an array"))
        }
    };

    let properties = match obj.get("properties") {
        None => Vec::new(),
        Some(Value::Object(props)) => props
            .iter()
            .map(|(name, raw)| -> Result<Property> {
                Ok(Property {
                    name: name.clone(),
                    node: compile_node(raw, &format!("{at}/properties/{name}"))?,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => {
            return Err(OakError::invalid_schema(&format!("{at}/properties"), "properties must be an object"))
        }
    };

    Ok(ObjectShape { required, properties })
}

fn compile_array(obj: &Map<String, Value>, at: &str) -> Result<ArrayShape> {
    let items_at = format!("{at}/items");
    let items = match obj.get("items") {
        None => None,
        Some(raw) if raw.is_object() => {
            let SchemaNode { pattern, shape, .. } = compile_node(raw, &items_at)?;
            let object = match shape {
                Shape::Object(shape) => Some(shape),
                _ => None,
            };
            Some(ItemRule { object, pattern })
        }
        Some(_) => {
            return Err(OakError::invalid_schema(&items_at, "items must be a single schema object"))
        }
    };

    Ok(ArrayShape {
        min_items: count_keyword(obj, "minItems", at)?,
        items,
    })
}

fn compile_pattern(obj: &Map<String, Value>, at: &str) -> Result<Option<Pattern>> {
    match obj.get("pattern") {
        None => Ok(None),
        Some(Value::String(source)) => Pattern::new(source)
            .map(Some)
            .map_err(|e| OakError::invalid_schema(&format!("{at}/pattern"), e.to_string())),
        Some(_) => Err(OakError::invalid_schema(&format!("{at}/pattern"), "pattern must be a string")),
    }
}

fn number_keyword(obj: &Map<String, Value>, key: &str, at: &str) -> Result<Option<f64>> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| OakError::invalid_schema(&format!("{at}/{key}"), format!("{key} must be a number"))),
    }
}

fn count_keyword(obj: &Map<String, Value>, key: &str, at: &str) -> Result<Option<u64>> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| {
            OakError::invalid_schema(&format!("{at}/{key}"), format!("{key} must be a non-negative integer"))
        }),
    }
}
