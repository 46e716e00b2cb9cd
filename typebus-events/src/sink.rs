//! Replaceable warning and error sinks

use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

/// Destination for registry diagnostics.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Default warning sink: one line on standard output.
pub fn stdout_sink() -> LogSink {
    Arc::new(|message: &str| println!("{message}"))
}

/// Default error sink: one line on standard error.
pub fn stderr_sink() -> LogSink {
    Arc::new(|message: &str| eprintln!("{message}"))
}

/// The pair of sinks a registry reports through.
///
/// Sinks are cloned out of their slot before being called, so a sink may
/// itself use the registry. A panicking sink loses that one message; the
/// panic does not reach the registry operation that reported it.
pub(crate) struct Sinks {
    warning: RwLock<LogSink>,
    error: RwLock<LogSink>,
}

impl Sinks {
    pub(crate) fn new(warning: LogSink, error: LogSink) -> Self {
        Self {
            warning: RwLock::new(warning),
            error: RwLock::new(error),
        }
    }

    pub(crate) fn set_warning(&self, sink: LogSink) {
        *self.warning.write() = sink;
    }

    pub(crate) fn set_error(&self, sink: LogSink) {
        *self.error.write() = sink;
    }

    pub(crate) fn warn(&self, message: &str) {
        let sink = self.warning.read().clone();
        deliver("warning", &sink, message);
    }

    pub(crate) fn error(&self, message: &str) {
        let sink = self.error.read().clone();
        deliver("error", &sink, message);
    }
}

fn deliver(kind: &'static str, sink: &LogSink, message: &str) {
    if panic::catch_unwind(AssertUnwindSafe(|| sink(message))).is_err() {
        error!(target: "typebus", sink = kind, dropped = message, "diagnostic sink panicked");
    }
}

impl Default for Sinks {
    fn default() -> Self {
        Self::new(stdout_sink(), stderr_sink())
    }
}
