//! Configuration management utilities
//!
//! Every configurable component in the workspace follows the same pattern:
//!
//! - a plain struct with a `Default` impl holding the documented defaults
//! - a `ConfigBuilder` impl that knows how to read itself from environment
//!   variables under a prefix, merge with another source and validate itself
//!
//! # Example
//!
//! ```rust,ignore
//! use agentic_common::config::{get_env_bool, get_env_parse, ConfigBuilder};
//!
//! #[derive(Clone, Default)]
//! struct WorkerConfig {
//!     pub enabled: Option<bool>,
//!     pub max_attempts: Option<usize>,
//! }
//!
//! impl ConfigBuilder for WorkerConfig {
//!     fn from_env(prefix: &str) -> agentic_common::Result<Self> {
//!         Ok(Self {
//!             enabled: get_env_bool(&format!("{}ENABLED", prefix))?,
//!             max_attempts: get_env_parse(&format!("{}MAX_ATTEMPTS", prefix))?,
//!         })
//!     }
//!
//!     fn merge(&mut self, other: Self) -> &mut Self {
//!         self.enabled = self.enabled.or(other.enabled);
//!         self.max_attempts = self.max_attempts.or(other.max_attempts);
//!         self
//!     }
//! }
//!
//! let config = WorkerConfig::from_env_with_defaults("WORKER_")?;
//! ```

mod builder;
mod env;

pub use builder::ConfigBuilder;
pub use env::{build_env_key, get_env, get_env_bool, get_env_parse, get_env_parse_or};
