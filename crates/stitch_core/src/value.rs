//! Metadata and attribute values.

use indexmap::IndexMap;

/// A scalar or simple value authored as metadata or as an attribute value.
///
/// Values are untyped at this level; the declared USD type of an attribute
/// lives on [`Attribute::type_name`].
///
/// Equality treats two NaN floats as equal, so a value always equals its
/// own copy.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Quoted string literal
    String(String),
    /// Bare identifier (e.g. `None`, `inf`, enum-like tokens)
    Token(String),
    /// Path literal `</World/Cube>`
    Path(String),
    /// Asset path literal `@./file.usda@`
    Asset(String),
    /// Composition reference `@./file.usda@</Prim>`, carried opaquely
    Reference { asset: String, prim: Option<String> },
    /// Parenthesized tuple `(1, 2, 3)`
    Tuple(Vec<Value>),
    /// Bracketed array `[a, b, c]`
    Array(Vec<Value>),
    /// Typed dictionary `{ string key = "value" }`
    Dictionary(IndexMap<String, Value>),
}

impl Value {
    /// Convenience constructor for a float tuple such as a translation or colour.
    pub fn float_tuple(components: &[f64]) -> Self {
        Value::Tuple(components.iter().copied().map(Value::Float).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Token(s) => Some(s),
            _ => None,
        }
    }

    /// USD type name used when this value appears inside a dictionary.
    pub fn type_hint(&self) -> String {
        match self {
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "double".to_string(),
            Value::String(_) | Value::Path(_) => "string".to_string(),
            Value::Token(_) => "token".to_string(),
            Value::Asset(_) | Value::Reference { .. } => "asset".to_string(),
            Value::Tuple(items) => format!("double{}", items.len()),
            Value::Array(items) => {
                let element = items
                    .first()
                    .map(Value::type_hint)
                    .unwrap_or_else(|| "string".to_string());
                format!("{}[]", element)
            }
            Value::Dictionary(_) => "dictionary".to_string(),
        }
    }
}

/// Float equality where NaN equals NaN.
pub(crate) fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_eq(*a, *b),
            (Value::String(a), Value::String(b))
            | (Value::Token(a), Value::Token(b))
            | (Value::Path(a), Value::Path(b))
            | (Value::Asset(a), Value::Asset(b)) => a == b,
            (
                Value::Reference { asset: a, prim: pa },
                Value::Reference { asset: b, prim: pb },
            ) => a == b && pa == pb,
            (Value::Tuple(a), Value::Tuple(b)) | (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Dictionary(a), Value::Dictionary(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// An authored attribute (typed property) on a prim.
#[derive(Clone, Debug, Default)]
pub struct Attribute {
    /// Declared USD type, including the `[]` suffix for arrays (e.g. `color3f[]`)
    pub type_name: String,

    /// Declared with the `custom` keyword
    pub custom: bool,

    /// Declared `uniform`
    pub uniform: bool,

    /// Default (non-animated) value
    pub default: Option<Value>,

    /// Time-sampled values in authored order
    pub time_samples: Vec<(f64, Value)>,

    /// Connection targets (`name.connect = </Path.prop>`)
    pub connections: Vec<String>,

    /// Attribute-level metadata (e.g. `interpolation`)
    pub metadata: IndexMap<String, Value>,
}

impl Attribute {
    /// An attribute with a type and a default value.
    pub fn new(type_name: impl Into<String>, default: Value) -> Self {
        Self {
            type_name: type_name.into(),
            default: Some(default),
            ..Default::default()
        }
    }

    /// An attribute declared without any value.
    pub fn declared(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn uniform(mut self) -> Self {
        self.uniform = true;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
            && self.custom == other.custom
            && self.uniform == other.uniform
            && self.default == other.default
            && self.time_samples.len() == other.time_samples.len()
            && self
                .time_samples
                .iter()
                .zip(&other.time_samples)
                .all(|((ta, va), (tb, vb))| float_eq(*ta, *tb) && va == vb)
            && self.connections == other.connections
            && self.metadata == other.metadata
    }
}
