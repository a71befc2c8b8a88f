//! Span attribute values and deferred input/output producers
//!
//! Callers describe span attributes with [`AgenticSpanAttributes`]. Each entry
//! is either a literal value or a deferred producer tagged as *input* or
//! *output*; producers only run when the recorder's redaction policy allows
//! that side to be recorded, so large payloads are never serialised for a span
//! that would drop them anyway.
//!
//! ```rust
//! use agentic_telemetry::AgenticSpanAttributes;
//!
//! let prompt = String::from("summarise the release notes");
//! let attributes = AgenticSpanAttributes::new()
//!     .literal("llm.provider", "openai")
//!     .literal("llm.temperature", 0.2)
//!     .input("llm.prompt", move || Some(prompt.into()));
//!
//! assert_eq!(attributes.len(), 3);
//! ```

use agentic_common::error::BoxError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Prefix applied to recorder metadata keys in the final attribute set
pub const METADATA_PREFIX: &str = "agentic.telemetry.metadata.";

/// Flat attribute set handed to the tracer
pub type Attributes = HashMap<String, AttributeValue>;

/// A value that can be recorded on a span
///
/// Mirrors the OpenTelemetry attribute model: scalars or homogeneous arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    BoolArray(Vec<bool>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl AttributeValue {
    /// Borrow the value as a string slice if it is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON value into an attribute value
    ///
    /// Scalars map directly, homogeneous arrays map to the typed array
    /// variants, and anything else (objects, nulls, mixed arrays) is recorded
    /// as its compact JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Bool(b) => Self::Bool(*b),
            Value::String(s) => Self::String(s.clone()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::Array(items) => match serde_json::from_value::<AttributeValue>(value.clone()) {
                Ok(array @ (Self::BoolArray(_)
                | Self::IntArray(_)
                | Self::FloatArray(_)
                | Self::StringArray(_))) if !items.is_empty() => array,
                _ => Self::String(value.to_string()),
            },
            Value::Null | Value::Object(_) => Self::String(value.to_string()),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => f.write_str(v),
            Self::BoolArray(v) => write!(f, "{:?}", v),
            Self::IntArray(v) => write!(f, "{:?}", v),
            Self::FloatArray(v) => write!(f, "{:?}", v),
            Self::StringArray(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::StringArray(value)
    }
}

impl From<Vec<i64>> for AttributeValue {
    fn from(value: Vec<i64>) -> Self {
        Self::IntArray(value)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(value: Vec<f64>) -> Self {
        Self::FloatArray(value)
    }
}

impl From<Vec<bool>> for AttributeValue {
    fn from(value: Vec<bool>) -> Self {
        Self::BoolArray(value)
    }
}

/// Deferred producer of an attribute value
///
/// `Ok(None)` omits the key; `Err` aborts the whole attribute conversion.
pub type AttributeProducer =
    Box<dyn FnOnce() -> std::result::Result<Option<AttributeValue>, BoxError> + Send>;

/// One entry of an [`AgenticSpanAttributes`] map
pub enum SpanAttribute {
    /// Recorded as-is
    Literal(AttributeValue),
    /// Evaluated only when inputs are recorded
    Input(AttributeProducer),
    /// Evaluated only when outputs are recorded
    Output(AttributeProducer),
    /// Declared but without a value; dropped during conversion
    Unset,
}

impl fmt::Debug for SpanAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Input(_) => f.write_str("Input(<deferred>)"),
            Self::Output(_) => f.write_str("Output(<deferred>)"),
            Self::Unset => f.write_str("Unset"),
        }
    }
}

impl<V: Into<AttributeValue>> From<Option<V>> for SpanAttribute {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Unset, |v| Self::Literal(v.into()))
    }
}

/// Ordered attribute declarations for one span
#[derive(Debug, Default)]
pub struct AgenticSpanAttributes {
    entries: Vec<(String, SpanAttribute)>,
}

impl AgenticSpanAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a literal attribute
    pub fn literal(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.entries
            .push((key.into(), SpanAttribute::Literal(value.into())));
        self
    }

    /// Add an attribute that may have no value; `None` is dropped
    pub fn optional<V: Into<AttributeValue>>(
        mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// Add an input attribute, produced only when inputs are recorded
    pub fn input<F>(self, key: impl Into<String>, producer: F) -> Self
    where
        F: FnOnce() -> Option<AttributeValue> + Send + 'static,
    {
        self.try_input(key, move || Ok(producer()))
    }

    /// Add a fallible input attribute producer
    pub fn try_input<F>(mut self, key: impl Into<String>, producer: F) -> Self
    where
        F: FnOnce() -> std::result::Result<Option<AttributeValue>, BoxError> + Send + 'static,
    {
        self.entries
            .push((key.into(), SpanAttribute::Input(Box::new(producer))));
        self
    }

    /// Add an output attribute, produced only when outputs are recorded
    pub fn output<F>(self, key: impl Into<String>, producer: F) -> Self
    where
        F: FnOnce() -> Option<AttributeValue> + Send + 'static,
    {
        self.try_output(key, move || Ok(producer()))
    }

    /// Add a fallible output attribute producer
    pub fn try_output<F>(mut self, key: impl Into<String>, producer: F) -> Self
    where
        F: FnOnce() -> std::result::Result<Option<AttributeValue>, BoxError> + Send + 'static,
    {
        self.entries
            .push((key.into(), SpanAttribute::Output(Box::new(producer))));
        self
    }

    /// Add a raw entry
    pub fn insert(mut self, key: impl Into<String>, attribute: SpanAttribute) -> Self {
        self.entries.push((key.into(), attribute));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for AgenticSpanAttributes {
    type Item = (String, SpanAttribute);
    type IntoIter = std::vec::IntoIter<(String, SpanAttribute)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, SpanAttribute)> for AgenticSpanAttributes {
    fn from_iter<I: IntoIterator<Item = (K, SpanAttribute)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
