//! Observer hooks for parse progress.
//!
//! Observers receive events in processing order and can record metrics or logs without
//! the parser taking a logging dependency. Attach one via
//! [`crate::ParseOptions::observer`].

use std::fmt;
use std::sync::Arc;

/// Events emitted while a parse runs.
#[derive(Debug, Clone)]
pub enum ParseEvent {
    /// A header row was consumed and column names are now fixed.
    HeaderResolved { columns: Vec<String> },
    /// A record was assembled and handed to the pipeline.
    RecordEmitted { line: u64 },
    /// A map/transform/reducer callback failed; the record was dropped.
    RecordFailed { line: Option<u64> },
    /// A batch was flushed through batch execution.
    BatchFlushed { records: u64 },
    /// Batch execution failed; the error was recovered into the result.
    BatchFailed,
    /// The stream ended and the result is about to be delivered.
    Finished { total_records: u64, errors: usize },
}

/// Observer hook for parse events.
pub trait ParseObserver: Send + Sync {
    fn on_event(&self, event: &ParseEvent);
}

/// Logs parse events to stderr.
#[derive(Debug, Default)]
pub struct StdErrParseObserver;

impl ParseObserver for StdErrParseObserver {
    fn on_event(&self, event: &ParseEvent) {
        eprintln!("[csv-batch] {event:?}");
    }
}

/// An observer that fans out events to a list of observers.
#[derive(Default)]
pub struct CompositeParseObserver {
    observers: Vec<Arc<dyn ParseObserver>>,
}

impl CompositeParseObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn ParseObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeParseObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeParseObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ParseObserver for CompositeParseObserver {
    fn on_event(&self, event: &ParseEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
