//! Scoped subscriptions

use crate::key::TopicKey;
use std::fmt;

/// Guard that unsubscribes its subscriber when dropped.
///
/// Release happens exactly once: on [`unsubscribe`](Self::unsubscribe) or on
/// drop, whichever comes first. [`detach`](Self::detach) gives up the guard
/// and leaves the subscriber registered.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    topic: TopicKey,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new<F>(topic: TopicKey, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            topic,
            release: Some(Box::new(release)),
        }
    }

    pub fn topic(&self) -> TopicKey {
        self.topic
    }

    /// Unsubscribe now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    /// Keep the subscriber registered after this guard is gone.
    pub fn detach(mut self) {
        self.release = None;
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("active", &self.release.is_some())
            .finish()
    }
}
