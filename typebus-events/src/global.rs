//! Process-wide default registry.
//!
//! Prefer passing an explicit [`Registry`] (or a bus built on one) from the
//! application's composition root. This module exists for code that wants a
//! shared instance without plumbing: both buses here share one registry,
//! configured from `TYPEBUS_*` environment variables on first use.
//!
//! ```rust
//! use typebus_events::{Callback, global};
//!
//! struct Saved;
//!
//! global::messages().subscribe(Callback::new(|_: &Saved| {})).unwrap();
//! global::messages().raise(&Saved).unwrap();
//! global::messages().clear::<Saved>();
//! ```

use crate::config::RegistryConfig;
use crate::handler::HandlerBus;
use crate::message::MessageBus;
use crate::registry::Registry;
use once_cell::sync::Lazy;

static REGISTRY: Lazy<Registry> = Lazy::new(|| Registry::with_config(RegistryConfig::from_env()));

static HANDLERS: Lazy<HandlerBus> = Lazy::new(|| HandlerBus::from_registry(REGISTRY.clone()));

static MESSAGES: Lazy<MessageBus> = Lazy::new(|| MessageBus::from_registry(REGISTRY.clone()));

/// The shared registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Handler-style bus over the shared registry.
pub fn handlers() -> &'static HandlerBus {
    &HANDLERS
}

/// Message-style bus over the shared registry.
pub fn messages() -> &'static MessageBus {
    &MESSAGES
}

/// Empty every topic of the shared registry.
pub fn reset() {
    REGISTRY.reset();
}

/// Replace the shared registry's warning sink.
pub fn set_warning_logger<F>(sink: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    REGISTRY.set_warning_logger(sink);
}

/// Replace the shared registry's error sink.
pub fn set_error_logger<F>(sink: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    REGISTRY.set_error_logger(sink);
}
