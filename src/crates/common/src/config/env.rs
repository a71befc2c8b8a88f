//! Environment variable loading
//!
//! Missing variables are `Ok(None)`; present but malformed variables are errors,
//! never silently replaced by a default.

use crate::{CommonError, Result};
use std::env;
use std::str::FromStr;

/// Read an environment variable
///
/// * `Ok(Some(value))` if the variable is set
/// * `Ok(None)` if it is not set
/// * `Err` if it is set but not valid UTF-8
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(CommonError::env(key, "contains invalid UTF-8")),
    }
}

/// Read and parse an environment variable
///
/// # Example
///
/// ```rust,ignore
/// let timeout_ms: Option<u64> = get_env_parse("AGENTIC_TASK_TIMEOUT_MS")?;
/// ```
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key)?
        .map(|val| {
            val.trim()
                .parse::<T>()
                .map_err(|e| CommonError::env(key, format!("failed to parse {:?}: {}", val, e)))
        })
        .transpose()
}

/// Read and parse an environment variable, falling back to `default` when it is not set
pub fn get_env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse(key)?.unwrap_or(default))
}

/// Read a boolean environment variable
///
/// Accepts "true", "1", "yes", "on" and "false", "0", "no", "off"
/// (case-insensitive). Anything else is an error.
pub fn get_env_bool(key: &str) -> Result<Option<bool>> {
    let Some(val) = get_env(key)? else {
        return Ok(None);
    };

    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(CommonError::env(key, format!("invalid boolean value {:?}", val))),
    }
}

/// Build a prefixed environment variable name
///
/// ```rust
/// use agentic_common::config::build_env_key;
///
/// assert_eq!(build_env_key("AGENTIC_TASK_", "timeout_ms"), "AGENTIC_TASK_TIMEOUT_MS");
/// ```
pub fn build_env_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name.to_uppercase())
}
