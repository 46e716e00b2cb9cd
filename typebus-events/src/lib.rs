//! Type-keyed in-process publish/subscribe
//!
//! This crate provides a registry mapping a type identity to the list of
//! subscribers registered for it, with two ways to use it.
//!
//! ## Features
//!
//! - **Handler style** - subscribers implement a capability trait; the trait
//!   object type is the topic
//! - **Message style** - callbacks keyed by the message type they accept
//! - **Type-checked** - a topic is bound to one subscriber type; reuse under a
//!   different type is a [`RegistryError::TypeMismatch`], never a bad cast
//! - **Isolated dispatch** - a failing or panicking subscriber is reported to
//!   the error sink and the rest still receive the event
//! - **Replaceable sinks** - warnings and subscriber faults go to injectable
//!   functions (stdout/stderr by default)
//!
//! Dispatch is synchronous and completes before `raise` returns, in
//! registration order. The registry may be shared across threads; list
//! locks are never held while a subscriber runs.
//!
//! ## Handler Style
//!
//! ```rust
//! use std::sync::Arc;
//! use typebus_events::*;
//!
//! trait PlayerDeadHandler: Send + Sync {
//!     fn handle_death(&self, player: &str, enemy: &str);
//! }
//! capability!(dyn PlayerDeadHandler);
//!
//! struct GameLogger;
//!
//! impl PlayerDeadHandler for GameLogger {
//!     fn handle_death(&self, player: &str, enemy: &str) {
//!         println!("Player {player} was killed by {enemy}");
//!     }
//! }
//!
//! let bus = HandlerBus::new();
//! let logger: Arc<dyn PlayerDeadHandler> = Arc::new(GameLogger);
//! let _subscription = bus.subscribe_scoped(logger).unwrap();
//!
//! bus.raise::<dyn PlayerDeadHandler, _>(|h| h.handle_death("alice", "bob"))
//!     .unwrap();
//! ```
//!
//! ## Message Style
//!
//! ```rust
//! use typebus_events::*;
//!
//! struct PlayerDead {
//!     player: String,
//! }
//!
//! let bus = MessageBus::new();
//! let on_dead = Callback::new(|m: &PlayerDead| println!("{} died", m.player));
//! bus.subscribe(on_dead.clone()).unwrap();
//!
//! let report = bus.raise(&PlayerDead { player: "alice".into() }).unwrap();
//! assert_eq!(report.delivered, 1);
//!
//! bus.unsubscribe(&on_dead).unwrap();
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use typebus_events::*;
//!
//! let registry = Registry::builder()
//!     .warn_on_empty_dispatch(false)
//!     .warning_logger(|m| eprintln!("[warn] {m}"))
//!     .build();
//!
//! let handlers = HandlerBus::from_registry(registry.clone());
//! let messages = MessageBus::from_registry(registry);
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod global;
pub mod handler;
pub mod key;
pub mod list;
pub mod message;
pub mod registry;
pub mod sink;
pub mod subscription;

pub use config::{RegistryBuilder, RegistryConfig};
pub use dispatch::DispatchReport;
pub use error::{HandlerError, RegistryError, Result};
pub use handler::{Capability, HandlerBus};
pub use key::TopicKey;
pub use list::{Equality, ListView, Subscriber, SubscriberList};
pub use message::{Callback, MessageBus};
pub use registry::Registry;
pub use sink::{LogSink, stderr_sink, stdout_sink};
pub use subscription::Subscription;
