//! Type-keyed registry of subscriber lists

use crate::config::{RegistryBuilder, RegistryConfig};
use crate::dispatch::{DispatchReport, dispatch};
use crate::error::{HandlerError, RegistryError, Result};
use crate::key::TopicKey;
use crate::list::{Equality, Subscriber, SubscriberList};
use crate::sink::{LogSink, Sinks};
use dashmap::DashMap;
use std::any::{Any, type_name};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Type-erased view of a `SubscriberList<E>`.
trait ErasedList: Send + Sync {
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Subscriber> ErasedList for SubscriberList<E> {
    fn clear(&mut self) {
        SubscriberList::clear(self);
    }

    fn len(&self) -> usize {
        SubscriberList::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A topic's list together with the element type it was created for.
struct TopicSlot {
    element: &'static str,
    list: Box<dyn ErasedList>,
}

impl TopicSlot {
    fn new<E: Subscriber>() -> Self {
        Self {
            element: type_name::<E>(),
            list: Box::new(SubscriberList::<E>::new()),
        }
    }

    fn typed<E: Subscriber>(&self, topic: TopicKey) -> Result<&SubscriberList<E>> {
        let element = self.element;
        self.list
            .as_any()
            .downcast_ref::<SubscriberList<E>>()
            .ok_or_else(|| mismatch::<E>(topic, element))
    }

    fn typed_mut<E: Subscriber>(&mut self, topic: TopicKey) -> Result<&mut SubscriberList<E>> {
        let element = self.element;
        self.list
            .as_any_mut()
            .downcast_mut::<SubscriberList<E>>()
            .ok_or_else(|| mismatch::<E>(topic, element))
    }
}

fn mismatch<E>(topic: TopicKey, bound: &'static str) -> RegistryError {
    RegistryError::TypeMismatch {
        topic,
        bound,
        requested: type_name::<E>(),
    }
}

/// Mapping from topic key to the subscribers registered for it.
///
/// Cloning is cheap and yields a handle to the same registry. Each topic is
/// bound to one subscriber type on first use; later operations under the
/// same key with a different type fail with [`RegistryError::TypeMismatch`].
///
/// The map is sharded and locked per topic (`DashMap`). Locks are held only
/// while a list is mutated or copied; subscribers are invoked on a snapshot
/// with no lock held, so they may call back into the registry.
#[derive(Clone)]
pub struct Registry {
    topics: Arc<DashMap<TopicKey, TopicSlot>>,
    sinks: Arc<Sinks>,
    config: Arc<RegistryConfig>,
}

impl Registry {
    /// Create an empty registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        RegistryBuilder::new().config(config).build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub(crate) fn from_parts(config: RegistryConfig, warning: LogSink, error: LogSink) -> Self {
        Self {
            topics: Arc::new(DashMap::with_capacity(config.initial_capacity)),
            sinks: Arc::new(Sinks::new(warning, error)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Replace the sink for non-fatal anomalies
    pub fn set_warning_logger<F>(&self, sink: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.sinks.set_warning(Arc::new(sink));
    }

    /// Replace the sink for subscriber faults
    pub fn set_error_logger<F>(&self, sink: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.sinks.set_error(Arc::new(sink));
    }

    /// Add `entry` to the list for `topic`, creating the list if needed.
    ///
    /// A duplicate entry is skipped with a warning. The topic's equality
    /// predicate runs with no lock held and may itself use the registry.
    pub fn subscribe<E: Subscriber>(&self, topic: TopicKey, entry: E) -> Result<()> {
        let mut entry = entry;
        loop {
            let view = self.slot_or_create::<E, _>(topic, |slot| {
                slot.typed::<E>(topic).map(SubscriberList::<E>::view)
            })?;

            if view.contains(&entry) {
                self.sinks.warn(&format!(
                    "subscriber {} is already registered for topic {topic}",
                    type_name::<E>()
                ));
                return Ok(());
            }

            // the list may have moved while the predicate ran; decide again if so
            match self.slot_or_create::<E, _>(topic, |slot| {
                Ok(slot.typed_mut::<E>(topic)?.push_if_current(view.revision(), entry))
            })? {
                None => break,
                Some(returned) => entry = returned,
            }
        }

        if self.config.enable_logging {
            debug!(topic = %topic, "subscribed");
        }
        Ok(())
    }

    /// Remove `entry` from the list for `topic`. Absent entries are ignored;
    /// an unknown topic only produces a warning.
    pub fn unsubscribe<E: Subscriber>(&self, topic: TopicKey, entry: &E) -> Result<()> {
        loop {
            let view = match self.topics.get(&topic) {
                Some(slot) => slot.typed::<E>(topic)?.view(),
                None => {
                    self.sinks
                        .warn(&format!("no subscriber list for topic {topic}; nothing to unsubscribe"));
                    return Ok(());
                }
            };

            let Some(index) = view.position(entry) else {
                return Ok(());
            };

            let removed = match self.topics.get_mut(&topic) {
                Some(mut slot) => slot
                    .typed_mut::<E>(topic)?
                    .remove_if_current(view.revision(), index),
                // reset while the predicate ran
                None => return Ok(()),
            };

            if removed {
                break;
            }
        }

        if self.config.enable_logging {
            debug!(topic = %topic, "unsubscribed");
        }
        Ok(())
    }

    /// Invoke `invoke` once per subscriber of `topic`, in registration order.
    ///
    /// Failures of individual subscribers are reported to the error sink and
    /// do not stop the dispatch. An unknown topic produces a warning and an
    /// empty report.
    pub fn raise<E, F>(&self, topic: TopicKey, invoke: F) -> Result<DispatchReport>
    where
        E: Subscriber,
        F: FnMut(&E) -> std::result::Result<(), HandlerError>,
    {
        let Some(entries) = self.snapshot::<E>(topic)? else {
            self.sinks.warn(&format!(
                "no subscriber list for topic {topic}; nobody is listening yet"
            ));
            return Ok(DispatchReport::empty(topic));
        };

        if entries.is_empty() {
            if self.config.warn_on_empty_dispatch {
                self.sinks
                    .warn(&format!("topic {topic} has no subscribers; nothing delivered"));
            }
            return Ok(DispatchReport::empty(topic));
        }

        let report = dispatch(topic, &entries, invoke, &self.sinks);

        if self.config.enable_logging {
            debug!(
                topic = %topic,
                delivered = report.delivered,
                failed = report.failed,
                "raised"
            );
        }

        Ok(report)
    }

    /// Remove every subscriber of `topic`, keeping the (now empty) list.
    pub fn clear(&self, topic: TopicKey) {
        match self.topics.get_mut(&topic) {
            Some(mut slot) => {
                slot.list.clear();
                if self.config.enable_logging {
                    debug!(topic = %topic, "cleared subscribers");
                }
            }
            None => self
                .sinks
                .warn(&format!("no subscriber list for topic {topic}; nothing to clear")),
        }
    }

    /// Empty every list and forget every topic.
    pub fn reset(&self) {
        for mut slot in self.topics.iter_mut() {
            slot.list.clear();
        }
        self.topics.clear();

        if self.config.enable_logging {
            info!("registry reset");
        }
    }

    /// Install the duplicate predicate for `topic`, creating its list if needed.
    pub fn set_equality<E: Subscriber>(&self, topic: TopicKey, equality: Equality<E>) -> Result<()> {
        self.slot_or_create::<E, _>(topic, |slot| {
            slot.typed_mut::<E>(topic)?.set_equality(equality);
            Ok(())
        })
    }

    /// Copy of the current subscribers of `topic`, or `None` if it has no list.
    pub fn snapshot<E: Subscriber>(&self, topic: TopicKey) -> Result<Option<Vec<E>>> {
        match self.topics.get(&topic) {
            Some(slot) => Ok(Some(slot.typed::<E>(topic)?.snapshot())),
            None => Ok(None),
        }
    }

    /// Route a fault that has no caller to return to, such as a failed
    /// release from a dropped [`Subscription`](crate::Subscription).
    pub(crate) fn report_error(&self, message: &str) {
        self.sinks.error(message);
    }

    /// Run `f` on the slot for `topic` under its shard lock, creating an
    /// empty list bound to `E` first if the topic is new.
    fn slot_or_create<E: Subscriber, T>(
        &self,
        topic: TopicKey,
        f: impl FnOnce(&mut TopicSlot) -> Result<T>,
    ) -> Result<T> {
        let mut slot = self.topics.entry(topic).or_insert_with(|| {
            if self.config.enable_logging {
                trace!(topic = %topic, element = type_name::<E>(), "created subscriber list");
            }
            TopicSlot::new::<E>()
        });
        f(&mut *slot)
    }

    /// Number of subscribers currently registered for `topic`.
    pub fn subscriber_count(&self, topic: TopicKey) -> usize {
        self.topics.get(&topic).map(|slot| slot.list.len()).unwrap_or(0)
    }

    /// Whether `topic` has a list (possibly empty).
    pub fn contains_topic(&self, topic: TopicKey) -> bool {
        self.topics.contains_key(&topic)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("topics", &self.topics.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[derive(Clone, PartialEq, Debug)]
    struct Tag(&'static str);

    impl Subscriber for Tag {
        fn same(&self, other: &Self) -> bool {
            self == other
        }
    }

    #[derive(Clone)]
    struct Other;

    impl Subscriber for Other {
        fn same(&self, _: &Self) -> bool {
            true
        }
    }

    struct Alpha;
    struct Beta;

    fn quiet() -> (Registry, Arc<Mutex<Vec<String>>>) {
        let warnings = Arc::new(Mutex::new(Vec::new()));
        let sink = warnings.clone();
        let registry = Registry::builder()
            .enable_logging(false)
            .warning_logger(move |m| sink.lock().unwrap().push(m.to_string()))
            .error_logger(|_| {})
            .build();
        (registry, warnings)
    }

    fn names(registry: &Registry, topic: TopicKey) -> Vec<&'static str> {
        registry
            .snapshot::<Tag>(topic)
            .unwrap()
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.0)
            .collect()
    }

    #[test]
    fn test_subscribe_creates_list() {
        let (registry, _) = quiet();
        let alpha = TopicKey::of::<Alpha>();
        assert!(!registry.contains_topic(alpha));

        registry.subscribe(alpha, Tag("a")).unwrap();

        assert!(registry.contains_topic(alpha));
        assert_eq!(registry.subscriber_count(alpha), 1);
        assert_eq!(registry.topic_count(), 1);
    }

    #[test]
    fn test_duplicate_warns_once() {
        let (registry, warnings) = quiet();
        let alpha = TopicKey::of::<Alpha>();

        registry.subscribe(alpha, Tag("a")).unwrap();
        registry.subscribe(alpha, Tag("a")).unwrap();

        assert_eq!(registry.subscriber_count(alpha), 1);
        let warnings = warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("already registered"));
    }

    #[test]
    fn test_type_mismatch_leaves_list_intact() {
        let (registry, _) = quiet();
        let alpha = TopicKey::of::<Alpha>();
        registry.subscribe(alpha, Tag("a")).unwrap();

        let err = registry.subscribe(alpha, Other).unwrap_err();
        assert!(matches!(err, RegistryError::TypeMismatch { .. }));
        assert!(registry.unsubscribe(alpha, &Other).is_err());
        assert!(registry.raise(alpha, |_: &Other| Ok(())).is_err());

        assert_eq!(names(&registry, alpha), ["a"]);
    }

    #[test]
    fn test_unsubscribe_unknown_topic_warns() {
        let (registry, warnings) = quiet();
        registry.unsubscribe(TopicKey::of::<Alpha>(), &Tag("a")).unwrap();
        assert_eq!(warnings.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_raise_unknown_topic_warns() {
        let (registry, warnings) = quiet();
        let report = registry
            .raise(TopicKey::of::<Alpha>(), |_: &Tag| Ok(()))
            .unwrap();
        assert_eq!(report.attempted, 0);
        assert!(warnings.lock().unwrap()[0].contains("nobody is listening"));
    }

    #[test]
    fn test_clear_keeps_other_topics() {
        let (registry, warnings) = quiet();
        let (alpha, beta) = (TopicKey::of::<Alpha>(), TopicKey::of::<Beta>());
        registry.subscribe(alpha, Tag("a")).unwrap();
        registry.subscribe(beta, Tag("b")).unwrap();

        registry.clear(alpha);

        assert!(registry.contains_topic(alpha));
        assert_eq!(registry.subscriber_count(alpha), 0);
        assert_eq!(names(&registry, beta), ["b"]);
        assert!(warnings.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_unknown_topic_warns() {
        let (registry, warnings) = quiet();
        registry.clear(TopicKey::of::<Alpha>());
        assert!(warnings.lock().unwrap()[0].contains("nothing to clear"));
    }

    #[test]
    fn test_reset_forgets_everything() {
        let (registry, _) = quiet();
        registry.subscribe(TopicKey::of::<Alpha>(), Tag("a")).unwrap();
        registry.subscribe(TopicKey::of::<Beta>(), Other).unwrap();

        registry.reset();

        assert_eq!(registry.topic_count(), 0);
        // a fresh binding is allowed after reset
        registry.subscribe(TopicKey::of::<Alpha>(), Other).unwrap();
    }

    #[test]
    fn test_raise_empty_list_warns() {
        let (registry, warnings) = quiet();
        let alpha = TopicKey::of::<Alpha>();
        registry.subscribe(alpha, Tag("a")).unwrap();
        registry.unsubscribe(alpha, &Tag("a")).unwrap();

        let report = registry.raise(alpha, |_: &Tag| Ok(())).unwrap();

        assert_eq!(report.attempted, 0);
        assert!(warnings.lock().unwrap()[0].contains("no subscribers"));
    }

    #[test]
    fn test_empty_dispatch_warning_can_be_disabled() {
        let warnings = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = warnings.clone();
        let registry = Registry::builder()
            .warn_on_empty_dispatch(false)
            .warning_logger(move |m| sink.lock().unwrap().push(m.to_string()))
            .build();
        let alpha = TopicKey::of::<Alpha>();
        registry.subscribe(alpha, Tag("a")).unwrap();
        registry.clear(alpha);

        registry.raise(alpha, |_: &Tag| Ok(())).unwrap();

        assert!(warnings.lock().unwrap().is_empty());
    }

    #[test]
    fn test_subscriber_may_reenter_registry() {
        let (registry, _) = quiet();
        let alpha = TopicKey::of::<Alpha>();
        registry.subscribe(alpha, Tag("a")).unwrap();

        let inner = registry.clone();
        let report = registry
            .raise(alpha, |_: &Tag| {
                inner.subscribe(alpha, Tag("late")).map_err(HandlerError::failed)
            })
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(names(&registry, alpha), ["a", "late"]);
    }

    #[test]
    fn test_set_equality_replaces_predicate() {
        let (registry, _) = quiet();
        let alpha = TopicKey::of::<Alpha>();
        let first_letter: Equality<Tag> = Arc::new(|a: &Tag, b: &Tag| a.0[..1] == b.0[..1]);
        registry.set_equality(alpha, first_letter).unwrap();

        registry.subscribe(alpha, Tag("apple")).unwrap();
        registry.subscribe(alpha, Tag("avocado")).unwrap();
        registry.subscribe(alpha, Tag("banana")).unwrap();

        assert_eq!(names(&registry, alpha), ["apple", "banana"]);
    }

    #[test]
    fn test_set_equality_creates_bound_list() {
        let (registry, _) = quiet();
        let alpha = TopicKey::of::<Alpha>();
        let by_value: Equality<Tag> = Arc::new(|a: &Tag, b: &Tag| a == b);

        registry.set_equality(alpha, by_value).unwrap();

        assert!(registry.contains_topic(alpha));
        assert_eq!(registry.subscriber_count(alpha), 0);
        assert!(matches!(
            registry.subscribe(alpha, Other),
            Err(RegistryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_equality_predicate_may_use_registry() {
        let (registry, _) = quiet();
        let (alpha, beta) = (TopicKey::of::<Alpha>(), TopicKey::of::<Beta>());
        let inner = registry.clone();
        let reading: Equality<Tag> = Arc::new(move |a: &Tag, b: &Tag| {
            let _ = inner.subscriber_count(alpha);
            let _ = inner.snapshot::<Tag>(alpha);
            inner.subscribe(beta, Tag("seen")).is_ok() && a == b
        });
        registry.set_equality(alpha, reading).unwrap();

        let worker = registry.clone();
        let (done, finished) = mpsc::channel();
        thread::spawn(move || {
            worker.subscribe(alpha, Tag("a")).unwrap();
            worker.subscribe(alpha, Tag("a")).unwrap();
            worker.subscribe(alpha, Tag("b")).unwrap();
            worker.unsubscribe(alpha, &Tag("a")).unwrap();
            done.send(()).unwrap();
        });

        finished
            .recv_timeout(Duration::from_secs(5))
            .expect("subscribe with a reentrant predicate did not finish");
        assert_eq!(names(&registry, alpha), ["b"]);
        assert_eq!(names(&registry, beta), ["seen"]);

        // the predicate keeps a handle to the registry
        registry.reset();
    }
}
