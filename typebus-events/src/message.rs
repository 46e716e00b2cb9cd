//! Message-style subscriptions
//!
//! Subscribers are callbacks keyed by the message type they accept. Raising
//! a message value delivers a reference to it to every callback registered
//! for that type.

use crate::dispatch::DispatchReport;
use crate::error::{HandlerError, Result};
use crate::key::TopicKey;
use crate::list::Subscriber;
use crate::registry::Registry;
use crate::subscription::Subscription;
use std::fmt;
use std::sync::Arc;

type CallbackFn<M> = dyn Fn(&M) -> std::result::Result<(), HandlerError> + Send + Sync;

/// A shareable message callback.
///
/// Clones share identity: unsubscribing with any clone removes the
/// subscription made with another.
pub struct Callback<M> {
    call: Arc<CallbackFn<M>>,
    name: Option<&'static str>,
}

impl<M: 'static> Callback<M> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        Self {
            call: Arc::new(move |message: &M| -> std::result::Result<(), HandlerError> {
                f(message);
                Ok(())
            }),
            name: None,
        }
    }

    /// A callback whose errors are reported to the error sink.
    pub fn fallible<F, E>(f: F) -> Self
    where
        F: Fn(&M) -> std::result::Result<(), E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self {
            call: Arc::new(move |message: &M| f(message).map_err(HandlerError::failed)),
            name: None,
        }
    }

    /// A callback carrying a name for diagnostics and name-based equality.
    pub fn named<F>(name: &'static str, f: F) -> Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        Self {
            name: Some(name),
            ..Self::new(f)
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Invoke the callback directly, bypassing any bus.
    pub fn call(&self, message: &M) -> std::result::Result<(), HandlerError> {
        (self.call)(message)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

impl<M> Clone for Callback<M> {
    fn clone(&self) -> Self {
        Self {
            call: self.call.clone(),
            name: self.name,
        }
    }
}

impl<M: Send + Sync + 'static> Subscriber for Callback<M> {
    fn same(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<M> fmt::Debug for Callback<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("message", &std::any::type_name::<M>())
            .field("name", &self.name)
            .finish()
    }
}

/// Message-style bus over a [`Registry`]
#[derive(Clone, Default, Debug)]
pub struct MessageBus {
    registry: Registry,
}

impl MessageBus {
    /// Create a bus over a fresh registry
    pub fn new() -> Self {
        Self::from_registry(Registry::new())
    }

    /// Create a bus sharing an existing registry
    pub fn from_registry(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register `callback` for messages of type `M`.
    pub fn subscribe<M: Send + Sync + 'static>(&self, callback: Callback<M>) -> Result<()> {
        self.registry.subscribe(TopicKey::of::<M>(), callback)
    }

    /// Register `callback` and return a guard that unregisters it on drop.
    pub fn subscribe_scoped<M: Send + Sync + 'static>(
        &self,
        callback: Callback<M>,
    ) -> Result<Subscription> {
        let topic = TopicKey::of::<M>();
        self.registry.subscribe(topic, callback.clone())?;

        let registry = self.registry.clone();
        Ok(Subscription::new(topic, move || {
            // the topic may have been reset and rebound to another type since
            if let Err(err) = registry.unsubscribe(topic, &callback) {
                registry.report_error(&format!(
                    "scoped subscription to topic {topic} could not be released: {err}"
                ));
            }
        }))
    }

    /// Unregister `callback` from messages of type `M`.
    pub fn unsubscribe<M: Send + Sync + 'static>(&self, callback: &Callback<M>) -> Result<()> {
        self.registry.unsubscribe(TopicKey::of::<M>(), callback)
    }

    /// Deliver `message` to every callback registered for `M`.
    pub fn raise<M: Send + Sync + 'static>(&self, message: &M) -> Result<DispatchReport> {
        self.registry
            .raise(TopicKey::of::<M>(), |callback: &Callback<M>| callback.call(message))
    }

    /// Remove every callback registered for `M`.
    pub fn clear<M: Send + Sync + 'static>(&self) {
        self.registry.clear(TopicKey::of::<M>());
    }

    pub fn subscriber_count<M: Send + Sync + 'static>(&self) -> usize {
        self.registry.subscriber_count(TopicKey::of::<M>())
    }

    /// Decide duplicate callbacks for `M` with `same` instead of identity.
    pub fn set_equality<M, P>(&self, same: P) -> Result<()>
    where
        M: Send + Sync + 'static,
        P: Fn(&Callback<M>, &Callback<M>) -> bool + Send + Sync + 'static,
    {
        self.registry
            .set_equality::<Callback<M>>(TopicKey::of::<M>(), Arc::new(same))
    }

    /// Empty the underlying registry.
    pub fn reset(&self) {
        self.registry.reset();
    }
}
