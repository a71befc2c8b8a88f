//! JSON Schema validation via the `jsonschema` crate

use super::{Schema, ValidationError, ValidationIssue};
use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// The schema document itself is invalid
#[derive(Debug, Error)]
#[error("Invalid JSON Schema: {0}")]
pub struct SchemaError(String);

/// Validates against a JSON Schema document, then deserializes into `T`
///
/// The document is compiled once, at construction.
///
/// ```rust
/// use agentic_task::schema::{JsonSchema, Schema};
/// use serde_json::{json, Value};
///
/// let schema = JsonSchema::<Value>::new(&json!({
///     "type": "object",
///     "properties": {"query": {"type": "string", "minLength": 1}},
///     "required": ["query"]
/// }))
/// .unwrap();
///
/// assert!(schema.parse(&json!({"query": "rust"})).is_ok());
/// let err = schema.parse(&json!({"query": 5})).unwrap_err();
/// assert_eq!(err.issues[0].path, "/query");
/// ```
pub struct JsonSchema<T = Value> {
    document: Value,
    compiled: JSONSchema,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSchema<T> {
    pub fn new(document: &Value) -> Result<Self, SchemaError> {
        let compiled = JSONSchema::compile(document).map_err(|e| SchemaError(e.to_string()))?;

        Ok(Self {
            document: document.clone(),
            compiled,
            _marker: PhantomData,
        })
    }

    /// The schema document this validator was compiled from
    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl<T: DeserializeOwned> Schema for JsonSchema<T> {
    type Parsed = T;

    fn parse(&self, raw: &Value) -> Result<T, ValidationError> {
        // Collect while the error iterator still borrows the compiled schema
        let issues = match self.compiled.validate(raw) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|e| ValidationIssue::new(e.instance_path.to_string(), e.to_string()))
                .collect(),
        };

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        serde_json::from_value(raw.clone())
            .map_err(|e| ValidationError::single(ValidationIssue::root(e.to_string())))
    }
}

impl<T> fmt::Debug for JsonSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}
