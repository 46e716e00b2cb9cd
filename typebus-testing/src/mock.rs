// Recording doubles for sinks and subscribers

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

type Lines = Arc<Mutex<Vec<String>>>;

fn lock(lines: &Lines) -> MutexGuard<'_, Vec<String>> {
    lines.lock()
}

/// Sink that keeps every message routed to it
#[derive(Clone, Default)]
pub struct RecordingSink {
    lines: Lines,
}

impl RecordingSink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink function to install as a warning or error logger
    pub fn sink(&self) -> impl Fn(&str) + Send + Sync + 'static {
        let lines = self.lines.clone();
        move |message: &str| lock(&lines).push(message.to_string())
    }

    /// Get all recorded messages
    pub fn messages(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    /// Get the number of recorded messages
    pub fn count(&self) -> usize {
        lock(&self.lines).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.lines).is_empty()
    }

    /// Check if any recorded message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        lock(&self.lines).iter().any(|m| m.contains(needle))
    }

    /// Clear all recorded messages
    pub fn clear(&self) {
        lock(&self.lines).clear();
    }
}

/// Ordered log of subscriber invocations
#[derive(Clone, Default)]
pub struct InvocationLog {
    entries: Lines,
}

impl InvocationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation
    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.entries).push(entry.into());
    }

    /// Get all invocations in the order they happened
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }

    /// Get the number of invocations recorded as `entry`
    pub fn count_of(&self, entry: &str) -> usize {
        lock(&self.entries).iter().filter(|e| *e == entry).count()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Clear all invocations
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink() {
        let recording = RecordingSink::new();
        let sink = recording.sink();
        sink("first warning");
        sink("second warning");

        assert_eq!(recording.count(), 2);
        assert!(recording.contains("second"));
        assert_eq!(recording.messages()[0], "first warning");

        recording.clear();
        assert!(recording.is_empty());
    }

    #[test]
    fn test_invocation_log_order() {
        let log = InvocationLog::new();
        log.record("a");
        log.record("b");
        log.record("a");

        assert_eq!(log.entries(), ["a", "b", "a"]);
        assert_eq!(log.count_of("a"), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_clones_share_entries() {
        let log = InvocationLog::new();
        let clone = log.clone();
        clone.record("from clone");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_survives_panic_while_locked() {
        let log = InvocationLog::new();
        log.record("before");
        let holder = log.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.entries.lock();
            panic!("subscriber panicked mid-record");
        })
        .join();

        log.record("after");
        assert_eq!(log.entries(), ["before", "after"]);
    }
}
