//! Recorder configuration
//!
//! Loaded from `AGENTIC_TELEMETRY_*` environment variables:
//!
//! | variable | type | default |
//! |---|---|---|
//! | `AGENTIC_TELEMETRY_ENABLED` | bool | `true` |
//! | `AGENTIC_TELEMETRY_RECORD_INPUTS` | bool | `true` |
//! | `AGENTIC_TELEMETRY_RECORD_OUTPUTS` | bool | `true` |
//! | `AGENTIC_TELEMETRY_METADATA` | JSON object | `{}` |

use crate::attributes::{AttributeValue, Attributes};
use agentic_common::config::{build_env_key, get_env, get_env_bool, ConfigBuilder};
use agentic_common::{CommonError, Result};
use serde_json::Value;

/// Default environment variable prefix
pub const ENV_PREFIX: &str = "AGENTIC_TELEMETRY_";

/// Settings for [`crate::TelemetryRecorder::from_config`]
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub record_inputs: bool,
    pub record_outputs: bool,
    pub metadata: Attributes,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            record_inputs: true,
            record_outputs: true,
            metadata: Attributes::new(),
        }
    }
}

impl TelemetryConfig {
    /// Load from the default `AGENTIC_TELEMETRY_` prefix
    pub fn load() -> Result<Self> {
        Self::from_env_with_defaults(ENV_PREFIX)
    }
}

impl ConfigBuilder for TelemetryConfig {
    fn from_env(prefix: &str) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            enabled: get_env_bool(&build_env_key(prefix, "enabled"))?.unwrap_or(defaults.enabled),
            record_inputs: get_env_bool(&build_env_key(prefix, "record_inputs"))?
                .unwrap_or(defaults.record_inputs),
            record_outputs: get_env_bool(&build_env_key(prefix, "record_outputs"))?
                .unwrap_or(defaults.record_outputs),
            metadata: metadata_from_env(&build_env_key(prefix, "metadata"))?,
        })
    }

    fn merge(&mut self, other: Self) -> &mut Self {
        self.enabled = other.enabled;
        self.record_inputs = other.record_inputs;
        self.record_outputs = other.record_outputs;
        self.metadata.extend(other.metadata);
        self
    }
}

fn metadata_from_env(key: &str) -> Result<Attributes> {
    let Some(raw) = get_env(key)? else {
        return Ok(Attributes::new());
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(entries)) => Ok(entries
            .iter()
            .map(|(name, value)| (name.clone(), AttributeValue::from_json(value)))
            .collect()),
        Ok(_) => Err(CommonError::env(key, "expected a JSON object")),
        Err(e) => Err(CommonError::env(key, format!("invalid JSON: {}", e))),
    }
}
