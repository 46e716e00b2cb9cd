// Registry configuration and builder

use crate::error::{RegistryError, Result};
use crate::registry::Registry;
use crate::sink::{LogSink, stderr_sink, stdout_sink};
use serde::Deserialize;
use std::env;
use std::sync::Arc;

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Emit lifecycle events through `tracing`
    pub enable_logging: bool,

    /// Number of topics to reserve room for
    pub initial_capacity: usize,

    /// Warn when raising a topic whose list exists but is empty
    pub warn_on_empty_dispatch: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            initial_capacity: 8,
            warn_on_empty_dispatch: true,
        }
    }
}

impl RegistryConfig {
    /// Read overrides from `TYPEBUS_*` environment variables.
    ///
    /// - `TYPEBUS_LOGGING=1|0`
    /// - `TYPEBUS_INITIAL_CAPACITY=<n>`
    /// - `TYPEBUS_WARN_ON_EMPTY=1|0`
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            enable_logging: env_flag("TYPEBUS_LOGGING").unwrap_or(defaults.enable_logging),
            initial_capacity: env::var("TYPEBUS_INITIAL_CAPACITY")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.initial_capacity),
            warn_on_empty_dispatch: env_flag("TYPEBUS_WARN_ON_EMPTY")
                .unwrap_or(defaults.warn_on_empty_dispatch),
        }
    }

    /// Parse a TOML document. Missing fields keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| RegistryError::Config(e.to_string()))
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Registry builder
pub struct RegistryBuilder {
    config: RegistryConfig,
    warning: LogSink,
    error: LogSink,
}

impl RegistryBuilder {
    /// Create a builder with default configuration and stdout/stderr sinks
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
            warning: stdout_sink(),
            error: stderr_sink(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable/disable tracing output
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Set the number of topics to reserve room for
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Enable/disable the warning for dispatch to an empty list
    pub fn warn_on_empty_dispatch(mut self, enabled: bool) -> Self {
        self.config.warn_on_empty_dispatch = enabled;
        self
    }

    /// Sink for non-fatal anomalies
    pub fn warning_logger<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.warning = Arc::new(sink);
        self
    }

    /// Sink for subscriber faults
    pub fn error_logger<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.error = Arc::new(sink);
        self
    }

    /// Build the registry
    pub fn build(self) -> Registry {
        Registry::from_parts(self.config, self.warning, self.error)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
