//! Testing utilities for typebus.
//!
//! - **RecordingSink** - captures warnings or subscriber faults instead of
//!   printing them
//! - **InvocationLog** - shared, ordered record of subscriber invocations
//!
//! ```
//! use typebus_testing::{InvocationLog, RecordingSink};
//!
//! let warnings = RecordingSink::new();
//! let sink = warnings.sink();
//! sink("no subscriber list for topic Dead");
//! assert!(warnings.contains("Dead"));
//!
//! let log = InvocationLog::new();
//! log.record("A");
//! log.record("B");
//! assert_eq!(log.entries(), ["A", "B"]);
//! ```

pub mod mock;

pub use mock::{InvocationLog, RecordingSink};
