//! Input and output schemas
//!
//! A [`Schema`] turns raw JSON into a parsed value or a [`ValidationError`]
//! listing every problem with its JSON pointer path. The executor never
//! looks inside a schema; anything that implements the trait can guard a
//! task boundary.
//!
//! - [`AnySchema`] accepts every value unchanged
//! - [`TypedSchema`] deserializes with serde after per-field checks
//! - [`JsonSchema`] validates against a JSON Schema document (`json-schema` feature)
//! - [`FnSchema`] wraps a closure

#[cfg(feature = "json-schema")]
mod json;
mod typed;

#[cfg(feature = "json-schema")]
pub use json::{JsonSchema, SchemaError};
pub use typed::{FieldValidator, TypedSchema};

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One problem found while validating a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// JSON pointer to the offending value; empty for the root
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// An issue about the value as a whole
    pub fn root(message: impl Into<String>) -> Self {
        Self::new("", message)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Structured validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn single(issue: ValidationIssue) -> Self {
        Self { issues: vec![issue] }
    }

    /// Paths of all issues, in report order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|issue| issue.path.as_str())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let issues: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        f.write_str(&issues.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Parses and validates raw values
pub trait Schema: Send + Sync {
    type Parsed;

    fn parse(&self, raw: &Value) -> Result<Self::Parsed, ValidationError>;
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    type Parsed = S::Parsed;

    fn parse(&self, raw: &Value) -> Result<Self::Parsed, ValidationError> {
        (**self).parse(raw)
    }
}

/// Accepts any value unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct AnySchema;

impl Schema for AnySchema {
    type Parsed = Value;

    fn parse(&self, raw: &Value) -> Result<Value, ValidationError> {
        Ok(raw.clone())
    }
}

/// Schema backed by a closure
pub struct FnSchema<T> {
    parse: Box<dyn Fn(&Value) -> Result<T, ValidationError> + Send + Sync>,
}

impl<T> FnSchema<T> {
    pub fn new<F>(parse: F) -> Self
    where
        F: Fn(&Value) -> Result<T, ValidationError> + Send + Sync + 'static,
    {
        Self {
            parse: Box::new(parse),
        }
    }
}

impl<T> Schema for FnSchema<T> {
    type Parsed = T;

    fn parse(&self, raw: &Value) -> Result<T, ValidationError> {
        (self.parse)(raw)
    }
}

impl<T> fmt::Debug for FnSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnSchema")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_any_schema_passthrough() {
        let raw = json!({"anything": [1, 2, 3]});
        assert_eq!(AnySchema.parse(&raw).unwrap(), raw);
    }

    #[test]
    fn test_fn_schema() {
        let schema = FnSchema::new(|raw: &Value| {
            raw.as_str()
                .map(str::to_uppercase)
                .ok_or_else(|| ValidationError::single(ValidationIssue::root("expected a string")))
        });

        assert_eq!(schema.parse(&json!("abc")).unwrap(), "ABC");
        let err = schema.parse(&json!(5)).unwrap_err();
        assert_eq!(err.to_string(), "(root): expected a string");
    }

    #[test]
    fn test_validation_error_display_joins_issues() {
        let err = ValidationError::new(vec![
            ValidationIssue::new("/query", "is required"),
            ValidationIssue::new("/limit", "must be at least 1"),
        ]);

        assert_eq!(err.to_string(), "/query: is required; /limit: must be at least 1");
        assert_eq!(err.paths().collect::<Vec<_>>(), vec!["/query", "/limit"]);
    }
}
