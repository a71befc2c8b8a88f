//! Configuration builder trait
//!
//! Gives configuration structs one shape for defaults, environment loading,
//! merging and validation.

use crate::Result;

/// Trait for configuration structures that support loading, merging and validation
///
/// # Example
///
/// ```rust,ignore
/// use agentic_common::config::ConfigBuilder;
///
/// #[derive(Clone, Default)]
/// struct RecorderConfig {
///     pub enabled: bool,
/// }
///
/// impl ConfigBuilder for RecorderConfig {
///     fn from_env(prefix: &str) -> agentic_common::Result<Self> {
///         let enabled = agentic_common::config::get_env_bool(&format!("{}ENABLED", prefix))?;
///         Ok(Self { enabled: enabled.unwrap_or(true) })
///     }
///
///     fn merge(&mut self, other: Self) -> &mut Self {
///         self.enabled = other.enabled;
///         self
///     }
/// }
/// ```
pub trait ConfigBuilder: Default + Clone {
    /// Validate the configuration
    ///
    /// The default implementation accepts everything.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Load configuration from environment variables named `{PREFIX}{FIELD}`
    ///
    /// Variables that are not set keep their default value.
    fn from_env(prefix: &str) -> Result<Self>;

    /// Merge another configuration into this one
    ///
    /// Values present in `other` overwrite the ones in `self`; collections
    /// are appended. Returns self for chaining.
    fn merge(&mut self, other: Self) -> &mut Self;

    /// Create and validate the default configuration
    fn build() -> Result<Self> {
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Start from defaults, layer the environment on top and validate
    fn from_env_with_defaults(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.merge(Self::from_env(prefix)?);
        config.validate()?;
        Ok(config)
    }
}
