// typebus - type-keyed in-process publish/subscribe
//
// This library re-exports the registry and both subscription styles, with
// logging setup and test helpers available behind features.

// Re-export core functionality
pub use typebus_events::*;

// Re-export optional crates
#[cfg(feature = "log")]
pub use typebus_log;

#[cfg(feature = "testing")]
pub use typebus_testing;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Callback, Capability, DispatchReport, HandlerBus, HandlerError, MessageBus, Registry,
        RegistryConfig, RegistryError, Subscription, TopicKey, capability, global,
    };
}
