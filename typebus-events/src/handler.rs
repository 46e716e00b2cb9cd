//! Interface-style subscriptions
//!
//! Subscribers are objects implementing a capability trait. The topic is the
//! trait object type itself (`dyn PlayerDeadHandler`), so every implementer of
//! the capability shares one list, and `raise` hands each of them to a
//! caller-supplied invocation.
//!
//! ```rust
//! use std::sync::Arc;
//! use typebus_events::{HandlerBus, capability};
//!
//! trait PlayerDeadHandler: Send + Sync {
//!     fn handle_death(&self, player: &str, enemy: &str);
//! }
//! capability!(dyn PlayerDeadHandler);
//!
//! struct GameController;
//!
//! impl PlayerDeadHandler for GameController {
//!     fn handle_death(&self, player: &str, _enemy: &str) {
//!         println!("{player} died");
//!     }
//! }
//!
//! let bus = HandlerBus::new();
//! let controller: Arc<dyn PlayerDeadHandler> = Arc::new(GameController);
//! bus.subscribe(controller.clone()).unwrap();
//!
//! bus.raise::<dyn PlayerDeadHandler, _>(|h| h.handle_death("alice", "bob")).unwrap();
//! ```

use crate::dispatch::DispatchReport;
use crate::error::{HandlerError, RegistryError, Result};
use crate::key::TopicKey;
use crate::registry::Registry;
use crate::subscription::Subscription;
use std::any::type_name;
use std::fmt::Display;
use std::mem::size_of;
use std::sync::Arc;

/// Marker for types usable as handler topics.
///
/// Implement it for trait object types with [`capability!`](crate::capability).
/// The trait must have `Send + Sync` as supertraits.
///
/// Marking anything other than a `dyn Trait` type (a concrete struct, `str`,
/// a slice) compiles, but every bus operation on it then fails with
/// [`RegistryError::NotACapability`].
pub trait Capability: Send + Sync + 'static {}

/// Declare one or more `dyn Trait` types as handler capabilities.
#[macro_export]
macro_rules! capability {
    ($($capability:ty),+ $(,)?) => {
        $(impl $crate::Capability for $capability {})+
    };
}

/// Topic key for `K`, rejecting anything that is not a trait object.
///
/// Only `dyn Trait` pointers carry a vtable; a thin `*const K` means `K` is a
/// concrete type that was marked as a capability by hand. `str` and slices
/// are wide too, so the type name settles those.
fn capability_key<K: Capability + ?Sized>() -> Result<TopicKey> {
    let wide = size_of::<*const K>() != size_of::<*const ()>();
    if !wide || !type_name::<K>().starts_with("dyn ") {
        return Err(RegistryError::NotACapability {
            type_name: type_name::<K>(),
        });
    }
    Ok(TopicKey::of::<K>())
}

/// Handler-style bus over a [`Registry`]
#[derive(Clone, Default, Debug)]
pub struct HandlerBus {
    registry: Registry,
}

impl HandlerBus {
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

    /// Subscribe `handler` to capability `K`.
    pub fn subscribe<K: Capability + ?Sized>(&self, handler: Arc<K>) -> Result<()> {
        self.registry.subscribe(capability_key::<K>()?, handler)
    }

    /// Subscribe `handler` and return a guard that unsubscribes it on drop.
    pub fn subscribe_scoped<K: Capability + ?Sized>(&self, handler: Arc<K>) -> Result<Subscription> {
        let topic = capability_key::<K>()?;
        self.registry.subscribe(topic, handler.clone())?;

        let registry = self.registry.clone();
        Ok(Subscription::new(topic, move || {
            // the topic may have been reset and rebound to another type since
            if let Err(err) = registry.unsubscribe(topic, &handler) {
                registry.report_error(&format!(
                    "scoped subscription to topic {topic} could not be released: {err}"
                ));
            }
        }))
    }

    /// Unsubscribe `handler` from capability `K`.
    pub fn unsubscribe<K: Capability + ?Sized>(&self, handler: &Arc<K>) -> Result<()> {
        self.registry.unsubscribe(capability_key::<K>()?, handler)
    }

    /// Call `invoke` with every handler of `K` in subscription order.
    ///
    /// A panicking handler is reported to the error sink and skipped.
    pub fn raise<K, F>(&self, mut invoke: F) -> Result<DispatchReport>
    where
        K: Capability + ?Sized,
        F: FnMut(&K),
    {
        self.registry
            .raise(capability_key::<K>()?, |handler: &Arc<K>| {
                invoke(handler.as_ref());
                Ok(())
            })
    }

    /// Like [`raise`](Self::raise), for invocations that can fail.
    pub fn try_raise<K, F, E>(&self, mut invoke: F) -> Result<DispatchReport>
    where
        K: Capability + ?Sized,
        F: FnMut(&K) -> std::result::Result<(), E>,
        E: Display,
    {
        self.registry
            .raise(capability_key::<K>()?, |handler: &Arc<K>| {
                invoke(handler.as_ref()).map_err(HandlerError::failed)
            })
    }

    /// Remove every handler of `K`.
    pub fn clear<K: Capability + ?Sized>(&self) -> Result<()> {
        self.registry.clear(capability_key::<K>()?);
        Ok(())
    }

    /// Number of handlers currently subscribed to `K`.
    pub fn handler_count<K: Capability + ?Sized>(&self) -> Result<usize> {
        Ok(self.registry.subscriber_count(capability_key::<K>()?))
    }

    /// Decide duplicates of `K` with `same` instead of object identity.
    pub fn set_equality<K, P>(&self, same: P) -> Result<()>
    where
        K: Capability + ?Sized,
        P: Fn(&K, &K) -> bool + Send + Sync + 'static,
    {
        self.registry.set_equality::<Arc<K>>(
            capability_key::<K>()?,
            Arc::new(move |a: &Arc<K>, b: &Arc<K>| same(a.as_ref(), b.as_ref())),
        )
    }

    /// Empty the underlying registry.
    pub fn reset(&self) {
        self.registry.reset();
    }
}
