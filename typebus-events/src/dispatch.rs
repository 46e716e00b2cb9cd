//! Isolated fan-out over a subscriber snapshot
//!
//! Each subscriber runs inside [`std::panic::catch_unwind`]. A returned
//! [`HandlerError`] or a panic is described to the error sink and dispatch
//! moves on to the next subscriber; it never stops early.
//!
//! The default panic hook still prints its own message for caught panics.

use crate::error::HandlerError;
use crate::key::TopicKey;
use crate::sink::Sinks;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Outcome of one `raise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub topic: TopicKey,
    /// Subscribers present in the snapshot
    pub attempted: usize,
    /// Subscribers that returned normally
    pub delivered: usize,
    /// Subscribers that failed or panicked
    pub failed: usize,
}

impl DispatchReport {
    pub(crate) fn empty(topic: TopicKey) -> Self {
        Self {
            topic,
            attempted: 0,
            delivered: 0,
            failed: 0,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

pub(crate) fn dispatch<E, F>(
    topic: TopicKey,
    entries: &[E],
    mut invoke: F,
    sinks: &Sinks,
) -> DispatchReport
where
    F: FnMut(&E) -> Result<(), HandlerError>,
{
    let mut report = DispatchReport::empty(topic);

    for (index, entry) in entries.iter().enumerate() {
        report.attempted += 1;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| invoke(entry)))
            .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload.as_ref()))));

        match outcome {
            Ok(()) => report.delivered += 1,
            Err(fault) => {
                report.failed += 1;
                sinks.error(&format!(
                    "subscriber #{index} of topic {topic} failed: {fault}"
                ));
            }
        }
    }

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
