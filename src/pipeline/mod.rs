//! The per-record async pipeline.
//!
//! Each assembled record flows through a map step and then a reduce step, both of which
//! may be asynchronous and are awaited to completion before the next record is touched.
//! Callback failures are isolated: a failing record contributes nothing and the stream
//! keeps going.
//!
//! The legacy transform pipeline is the same machinery with a fixed append-reducer and
//! untagged error recording; the choice is made once when options are built, never per
//! record.

pub(crate) mod batch;

use futures::future::BoxFuture;

use crate::error::{BoxError, CallbackResult, ParseFailure};
use crate::types::Record;

/// Type-erased map/transform callback.
pub(crate) type MapFn =
    Box<dyn FnMut(Record) -> BoxFuture<'static, CallbackResult<Option<Record>>> + Send>;

/// Type-erased accumulator seed.
pub(crate) type SeedFn<A> = Box<dyn FnMut() -> A + Send>;

/// Type-erased reducer callback. The `u64` is the 1-based index of the record among
/// successfully processed records.
pub(crate) type ReducerFn<A> =
    Box<dyn FnMut(A, Record, u64) -> BoxFuture<'static, Folded<A>> + Send>;

/// Type-erased batch-execution callback.
pub(crate) type BatchExecutionFn<A, O> =
    Box<dyn FnMut(A) -> BoxFuture<'static, CallbackResult<Option<O>>> + Send>;

/// Outcome of one reduce step.
///
/// The accumulator is threaded by value, so a rejecting reducer hands it back unchanged
/// along with the error; the record then contributes nothing.
#[derive(Debug)]
pub enum Folded<A> {
    /// The record was folded in; this is the new accumulator.
    Next(A),
    /// The record was rejected; the accumulator is returned untouched.
    Reject { acc: A, error: BoxError },
}

impl<A> Folded<A> {
    /// Reject the current record, handing the accumulator back unchanged.
    pub fn reject(acc: A, error: impl Into<BoxError>) -> Self {
        Folded::Reject {
            acc,
            error: error.into(),
        }
    }
}

/// What happened to one record in the pipeline.
pub(crate) enum RecordOutcome {
    /// Folded into the accumulator; counts advance.
    Reduced,
    /// Silently dropped by the map step; not counted, no error.
    Dropped,
    /// A callback failed; the failure is recovered into the result.
    Failed(ParseFailure),
}

/// Applies map then reduce to each record, sequentially.
pub(crate) struct RecordPipeline<A> {
    map: MapFn,
    reducer: ReducerFn<A>,
    tag_lines: bool,
}

impl<A> RecordPipeline<A> {
    pub(crate) fn new(map: MapFn, reducer: ReducerFn<A>, tag_lines: bool) -> Self {
        Self {
            map,
            reducer,
            tag_lines,
        }
    }

    /// Run one record through the pipeline, returning the (possibly updated)
    /// accumulator and the outcome.
    pub(crate) async fn process(
        &mut self,
        acc: A,
        record: Record,
        next_index: u64,
    ) -> (A, RecordOutcome) {
        let line = record.line;
        let mapped = match (self.map)(record).await {
            Ok(Some(mapped)) => mapped,
            Ok(None) => return (acc, RecordOutcome::Dropped),
            Err(error) => {
                let line = self.tag_lines.then_some(line);
                return (acc, RecordOutcome::Failed(ParseFailure { line, error }));
            }
        };

        match (self.reducer)(acc, mapped, next_index).await {
            Folded::Next(acc) => (acc, RecordOutcome::Reduced),
            Folded::Reject { acc, error } => (
                acc,
                RecordOutcome::Failed(ParseFailure {
                    line: Some(line),
                    error,
                }),
            ),
        }
    }
}
