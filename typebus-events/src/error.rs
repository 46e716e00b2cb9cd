// Error types for the type-keyed registry

use crate::key::TopicKey;
use thiserror::Error;

/// Usage errors surfaced to the caller of a registry operation.
///
/// Everything else (unknown topics, duplicate subscriptions, failing
/// subscribers) is absorbed by the registry and reported through its sinks.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("`{type_name}` is not a capability trait object; handler topics must be keyed by `dyn Trait`")]
    NotACapability { type_name: &'static str },

    #[error("topic `{topic}` holds `{bound}` subscribers and cannot be accessed as `{requested}`")]
    TypeMismatch {
        topic: TopicKey,
        bound: &'static str,
        requested: &'static str,
    },

    #[error("invalid registry configuration: {0}")]
    Config(String),
}

/// Fault raised by a single subscriber during dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Wrap any displayable error as a handler failure.
    pub fn failed(err: impl std::fmt::Display) -> Self {
        HandlerError::Failed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    trait Probe {}

    #[test]
    fn test_type_mismatch_names_both_types() {
        let err = RegistryError::TypeMismatch {
            topic: TopicKey::of::<dyn Probe>(),
            bound: "alloc::vec::Vec<u8>",
            requested: "alloc::string::String",
        };
        let display = err.to_string();
        assert!(display.contains("Probe"));
        assert!(display.contains("Vec<u8>"));
        assert!(display.contains("String"));
    }

    #[test]
    fn test_handler_error_display() {
        assert_eq!(HandlerError::failed("disk full").to_string(), "handler failed: disk full");
        assert_eq!(
            HandlerError::Panicked("boom".into()).to_string(),
            "handler panicked: boom"
        );
    }
}
