//! typebus logging setup
//!
//! Installs a `tracing` subscriber configured from the environment and
//! provides sink functions that forward registry diagnostics to `tracing`
//! instead of stdout/stderr.
//!
//! # Usage
//!
//! ```rust
//! use typebus_events::Registry;
//!
//! typebus_log::init();
//!
//! let registry = Registry::builder()
//!     .warning_logger(typebus_log::warning_sink())
//!     .error_logger(typebus_log::error_sink())
//!     .build();
//! # drop(registry);
//! ```
//!
//! # Environment Variables
//!
//! - `TYPEBUS_DEBUG=1` - Enable debug logging
//! - `TYPEBUS_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `TYPEBUS_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `NO_COLOR` - Disable ANSI colors
//!
//! `RUST_LOG`, when set, takes precedence over `TYPEBUS_LOG_LEVEL`.

use once_cell::sync::Lazy;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Target used for messages forwarded by the sinks.
pub const TARGET: &str = "typebus";

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl Level {
    /// Directive understood by `EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl FromStr for Level {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "off" | "none" => Ok(Level::Off),
            _ => Err(ParseError::new("level", s)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line, human oriented
    Pretty,
    /// Single line per event
    Compact,
    /// One JSON object per event (requires the `json` feature)
    Json,
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "compact" => Ok(Format::Compact),
            "json" => Ok(Format::Json),
            _ => Err(ParseError::new("format", s)),
        }
    }
}

/// Unrecognised level or format name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log {kind}: {value:?}")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl ParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
    pub color: bool,
    /// Include the event target in each line
    pub targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Compact,
            color: true,
            targets: true,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    ///
    /// Unrecognised values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let debug = lookup("TYPEBUS_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let level = lookup("TYPEBUS_LOG_LEVEL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(if debug { Level::Debug } else { defaults.level });

        let format = lookup("TYPEBUS_LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.format);

        let color = lookup("NO_COLOR").is_none() && format != Format::Json;

        Self {
            level,
            format,
            color,
            targets: defaults.targets,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_filter()))
    }
}

/// The configuration read from the environment on first use.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

// ============================================================================
// Subscriber Installation
// ============================================================================

/// Install a global `tracing` subscriber from the environment configuration.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init() -> bool {
    init_with(config())
}

/// Install a global `tracing` subscriber from `config`.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_with(config: &LogConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_ansi(config.color)
        .with_target(config.targets);

    match config.format {
        Format::Pretty => builder.pretty().try_init().is_ok(),
        Format::Compact => builder.compact().try_init().is_ok(),
        #[cfg(feature = "json")]
        Format::Json => builder.json().try_init().is_ok(),
        #[cfg(not(feature = "json"))]
        Format::Json => builder.compact().try_init().is_ok(),
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Warning sink that emits `tracing::warn!` under [`TARGET`].
pub fn warning_sink() -> impl Fn(&str) + Send + Sync + 'static {
    |message: &str| tracing::warn!(target: TARGET, "{message}")
}

/// Error sink that emits `tracing::error!` under [`TARGET`].
pub fn error_sink() -> impl Fn(&str) + Send + Sync + 'static {
    |message: &str| tracing::error!(target: TARGET, "{message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("debug".parse::<Level>(), Ok(Level::Debug));
        assert_eq!("WARNING".parse::<Level>(), Ok(Level::Warn));
        assert_eq!("none".parse::<Level>(), Ok(Level::Off));
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Error < Level::Off);
        assert_eq!(Level::Warn.to_string(), "warn");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<Format>(), Ok(Format::Json));
        assert_eq!(" Compact ".parse::<Format>(), Ok(Format::Compact));
        let err = "xml".parse::<Format>().unwrap_err();
        assert_eq!(err.to_string(), r#"unknown log format: "xml""#);

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_defaults_without_variables() {
        assert_eq!(LogConfig::from_lookup(lookup(&[])), LogConfig::default());
    }

    #[test]
    fn test_debug_flag_lowers_level() {
        let config = LogConfig::from_lookup(lookup(&[("TYPEBUS_DEBUG", "true")]));
        assert_eq!(config.level, Level::Debug);
    }

    #[test]
    fn test_explicit_level_wins_over_debug() {
        let config = LogConfig::from_lookup(lookup(&[
            ("TYPEBUS_DEBUG", "1"),
            ("TYPEBUS_LOG_LEVEL", "error"),
        ]));
        assert_eq!(config.level, Level::Error);
    }

    #[test]
    fn test_json_and_no_color_disable_ansi() {
        let json = LogConfig::from_lookup(lookup(&[("TYPEBUS_LOG_FORMAT", "json")]));
        assert_eq!(json.format, Format::Json);
        assert!(!json.color);

        let plain = LogConfig::from_lookup(lookup(&[("NO_COLOR", "1")]));
        assert!(!plain.color);
    }

    #[test]
    fn test_sinks_do_not_panic_without_subscriber() {
        warning_sink()("nobody listening");
        error_sink()("subscriber failed");
    }
}
