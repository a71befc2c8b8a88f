//! Serde-backed schema with per-field checks
//!
//! ```rust
//! use agentic_task::schema::{FieldValidator, Schema, TypedSchema};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Debug, Deserialize)]
//! struct SearchInput {
//!     query: String,
//!     limit: Option<u32>,
//! }
//!
//! let schema = TypedSchema::<SearchInput>::new()
//!     .field("query", FieldValidator::new().string().not_empty())
//!     .field("limit", FieldValidator::new().optional().integer().min(1.0).max(50.0));
//!
//! let input = schema.parse(&json!({"query": "rust"})).unwrap();
//! assert_eq!(input.query, "rust");
//!
//! let err = schema.parse(&json!({"query": "", "limit": 500})).unwrap_err();
//! assert_eq!(err.issues.len(), 2);
//! ```

use super::{Schema, ValidationError, ValidationIssue};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

type Rule = Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Chainable checks for one field
///
/// Rules run in the order they were added; the first failing rule is the one
/// reported for the field.
pub struct FieldValidator {
    required: bool,
    rules: Vec<Rule>,
}

impl FieldValidator {
    /// A required field with no further checks
    pub fn new() -> Self {
        Self {
            required: true,
            rules: Vec::new(),
        }
    }

    /// Missing or `null` values pass without running the other rules
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Add a custom rule
    pub fn custom<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn string(self) -> Self {
        self.custom(|value| expect(value.is_string(), "must be a string"))
    }

    pub fn integer(self) -> Self {
        self.custom(|value| expect(value.is_i64() || value.is_u64(), "must be an integer"))
    }

    pub fn number(self) -> Self {
        self.custom(|value| expect(value.is_number(), "must be a number"))
    }

    pub fn boolean(self) -> Self {
        self.custom(|value| expect(value.is_boolean(), "must be a boolean"))
    }

    pub fn array(self) -> Self {
        self.custom(|value| expect(value.is_array(), "must be an array"))
    }

    pub fn object(self) -> Self {
        self.custom(|value| expect(value.is_object(), "must be an object"))
    }

    /// Strings, arrays and objects must have at least one element
    pub fn not_empty(self) -> Self {
        self.custom(|value| match length(value) {
            Some(0) => Err("must not be empty".to_string()),
            _ => Ok(()),
        })
    }

    /// Minimum length of a string (in characters) or array
    pub fn min_length(self, min: usize) -> Self {
        self.custom(move |value| match length(value) {
            Some(len) if len < min => Err(format!(
                "must have at least {} elements (got {})",
                min, len
            )),
            _ => Ok(()),
        })
    }

    /// Maximum length of a string (in characters) or array
    pub fn max_length(self, max: usize) -> Self {
        self.custom(move |value| match length(value) {
            Some(len) if len > max => Err(format!(
                "must have at most {} elements (got {})",
                max, len
            )),
            _ => Ok(()),
        })
    }

    pub fn min(self, min: f64) -> Self {
        self.custom(move |value| match value.as_f64() {
            Some(n) if n < min => Err(format!("must be at least {} (got {})", min, n)),
            _ => Ok(()),
        })
    }

    pub fn max(self, max: f64) -> Self {
        self.custom(move |value| match value.as_f64() {
            Some(n) if n > max => Err(format!("must be at most {} (got {})", max, n)),
            _ => Ok(()),
        })
    }

    /// String values must match `regex`
    pub fn matches(self, regex: Regex) -> Self {
        self.custom(move |value| match value.as_str() {
            Some(s) if !regex.is_match(s) => Err(format!("must match pattern: {}", regex.as_str())),
            _ => Ok(()),
        })
    }

    /// Value must equal one of `allowed`
    pub fn one_of<I, V>(self, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
        self.custom(move |value| {
            if allowed.contains(value) {
                Ok(())
            } else {
                Err(format!("must be one of {}", Value::Array(allowed.clone())))
            }
        })
    }

    fn check(&self, pointer: &str, value: Option<&Value>) -> Option<ValidationIssue> {
        let value = match value {
            Some(Value::Null) | None if !self.required => return None,
            None => return Some(ValidationIssue::new(pointer, "is required")),
            Some(value) => value,
        };

        self.rules
            .iter()
            .find_map(|rule| rule(value).err())
            .map(|message| ValidationIssue::new(pointer, message))
    }
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidator")
            .field("required", &self.required)
            .field("rules", &self.rules.len())
            .finish()
    }
}

fn expect(ok: bool, message: &str) -> Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(entries) => Some(entries.len()),
        _ => None,
    }
}

/// Turn `a.b` or `/a/b` into a JSON pointer
fn to_pointer(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path.replace('.', "/"))
    }
}

/// Schema that checks fields, then deserializes into `T`
pub struct TypedSchema<T> {
    fields: Vec<(String, FieldValidator)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Validate the value at `path` (dotted or JSON pointer)
    pub fn field(mut self, path: &str, validator: FieldValidator) -> Self {
        self.fields.push((to_pointer(path), validator));
        self
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSchema")
            .field("type", &std::any::type_name::<T>())
            .field("fields", &self.fields)
            .finish()
    }
}

impl<T: DeserializeOwned> Schema for TypedSchema<T> {
    type Parsed = T;

    fn parse(&self, raw: &Value) -> Result<T, ValidationError> {
        let issues: Vec<ValidationIssue> = self
            .fields
            .iter()
            .filter_map(|(pointer, validator)| validator.check(pointer, raw.pointer(pointer)))
            .collect();

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        serde_json::from_value(raw.clone())
            .map_err(|e| ValidationError::single(ValidationIssue::root(e.to_string())))
    }
}
