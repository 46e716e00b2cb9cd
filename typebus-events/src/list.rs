//! Per-topic subscriber lists

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Predicate deciding whether two subscriber entries are the same subscriber.
pub type Equality<E> = Arc<dyn Fn(&E, &E) -> bool + Send + Sync>;

// Shared by every list so a revision never repeats, even across a topic that
// was dropped by `reset` and created again.
static REVISIONS: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    REVISIONS.fetch_add(1, Ordering::Relaxed)
}

/// An entry that can be stored in a [`SubscriberList`].
///
/// `same` is the default duplicate check used until a topic installs its
/// own [`Equality`].
pub trait Subscriber: Clone + Send + Sync + 'static {
    fn same(&self, other: &Self) -> bool;
}

/// Handler objects compare by address, ignoring trait-object metadata.
impl<K: ?Sized + Send + Sync + 'static> Subscriber for Arc<K> {
    fn same(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(self), Arc::as_ptr(other))
    }
}

/// Ordered, duplicate-free collection of subscribers for one topic.
///
/// Every mutation moves the list to a new revision. A [`ListView`] taken at
/// one revision can decide membership with the predicate while nothing is
/// locked, and the decision is applied with [`push_if_current`] or
/// [`remove_if_current`] only if the list has not moved since.
///
/// [`push_if_current`]: Self::push_if_current
/// [`remove_if_current`]: Self::remove_if_current
pub struct SubscriberList<E> {
    entries: Vec<E>,
    equality: Equality<E>,
    revision: u64,
}

impl<E: Subscriber> SubscriberList<E> {
    /// Create an empty list using `E::same` for duplicate detection.
    pub fn new() -> Self {
        Self::with_equality(Arc::new(|a: &E, b: &E| a.same(b)))
    }

    /// Create an empty list using a custom duplicate predicate.
    pub fn with_equality(equality: Equality<E>) -> Self {
        Self {
            entries: Vec::new(),
            equality,
            revision: next_revision(),
        }
    }

    /// Replace the duplicate predicate. Existing entries are kept as-is.
    pub fn set_equality(&mut self, equality: Equality<E>) {
        self.equality = equality;
        self.revision = next_revision();
    }

    /// Append `entry` unless an equal one is already present.
    ///
    /// Returns `false` when the entry was a duplicate and nothing was inserted.
    pub fn add(&mut self, entry: E) -> bool {
        if self.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        self.revision = next_revision();
        true
    }

    /// Remove the first entry equal to `entry`. Returns whether one was removed.
    pub fn remove(&mut self, entry: &E) -> bool {
        match self.entries.iter().position(|e| (self.equality)(e, entry)) {
            Some(index) => {
                self.entries.remove(index);
                self.revision = next_revision();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, entry: &E) -> bool {
        self.entries.iter().any(|e| (self.equality)(e, entry))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.revision = next_revision();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the current entries in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entries.iter()
    }

    /// Copy of the current entries, detached from later mutation.
    pub fn snapshot(&self) -> Vec<E> {
        self.entries.clone()
    }

    /// Entries and predicate as of the current revision.
    pub fn view(&self) -> ListView<E> {
        ListView {
            entries: self.snapshot(),
            equality: self.equality.clone(),
            revision: self.revision,
        }
    }

    /// Append `entry` if the list is still at `revision`.
    ///
    /// Hands the entry back when the list has moved on.
    pub fn push_if_current(&mut self, revision: u64, entry: E) -> Option<E> {
        if self.revision != revision {
            return Some(entry);
        }
        self.entries.push(entry);
        self.revision = next_revision();
        None
    }

    /// Remove the entry at `index` if the list is still at `revision`.
    pub fn remove_if_current(&mut self, revision: u64, index: usize) -> bool {
        if self.revision != revision || index >= self.entries.len() {
            return false;
        }
        self.entries.remove(index);
        self.revision = next_revision();
        true
    }
}

/// Detached copy of a list, for running the predicate without a lock.
pub struct ListView<E> {
    entries: Vec<E>,
    equality: Equality<E>,
    revision: u64,
}

impl<E> ListView<E> {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Index of the first entry equal to `entry`.
    pub fn position(&self, entry: &E) -> Option<usize> {
        self.entries.iter().position(|e| (self.equality)(e, entry))
    }

    pub fn contains(&self, entry: &E) -> bool {
        self.position(entry).is_some()
    }
}

impl<E: Subscriber> Default for SubscriberList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E: Subscriber> IntoIterator for &'a SubscriberList<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<E> fmt::Debug for SubscriberList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberList")
            .field("len", &self.entries.len())
            .finish()
    }
}
