//! Parse configuration.
//!
//! Scalar options are plain public fields with [`Default`]s; the async callback slots
//! are set through consuming builder methods that box the supplied closures. The two
//! pipeline flavors (map + fold, and the legacy transform-into-a-buffer) are chosen
//! here, once, and never re-selected per record.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::ready;

use crate::error::CallbackResult;
use crate::observability::ParseObserver;
use crate::pipeline::{BatchExecutionFn, Folded, MapFn, ReducerFn, SeedFn};
use crate::types::Record;

/// Column configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Columns {
    /// No column mapping; records are emitted as raw rows (unless a header row
    /// resolves names first).
    #[default]
    None,
    /// Fixed column names, in order.
    Names(Vec<String>),
}

impl Columns {
    /// Build a [`Columns::Names`] from anything iterable as strings.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Columns::Names(names.into_iter().map(Into::into).collect())
    }
}

/// Options controlling one parse.
///
/// `A` is the accumulator type threaded through the reducer; `O` is the output type of
/// batch execution. The defaults collect records into a `Vec<Record>` and pass
/// accumulators through batch execution unchanged.
///
/// Scalar fields can be assigned directly; callbacks go through the builder methods:
///
/// ```
/// use csv_batch::{Folded, ParseOptions};
///
/// let mut options = ParseOptions::new();
/// options.header = false;
/// options.batch = true;
/// options.batch_size = 500;
/// let options = options
///     .fold(|| 0u64, |acc, _record, _index| async move { Folded::Next(acc + 1) })
///     .batch_execution(|count| async move { Ok(Some(count)) });
/// # let _ = options;
/// ```
pub struct ParseOptions<A = Vec<Record>, O = Vec<Record>> {
    /// Field delimiter.
    pub delimiter: char,
    /// Quote character.
    pub quote: char,
    /// Treat the first row as column names.
    pub header: bool,
    /// Column names to map records with, when `header` is off.
    pub columns: Columns,
    /// Attach the starting line number and verbatim raw text to every record.
    pub detail: bool,
    /// Empty (or whitespace-only) unquoted fields become [`crate::Field::Null`].
    pub null_on_empty: bool,
    /// Group folded records into batches and run batch execution per batch.
    pub batch: bool,
    /// Records per batch. Must be positive when `batch` is on.
    pub batch_size: usize,
    /// Optional observer for parse events.
    pub observer: Option<Arc<dyn ParseObserver>>,

    pub(crate) map: MapFn,
    pub(crate) seed: SeedFn<A>,
    pub(crate) reducer: ReducerFn<A>,
    pub(crate) batch_execution: BatchExecutionFn<A, O>,
    pub(crate) legacy_transform: bool,
}

impl ParseOptions {
    /// Options with every default: comma/double-quote syntax, header row on, records
    /// collected into a `Vec<Record>`, no batching.
    pub fn new() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            header: true,
            columns: Columns::None,
            detail: false,
            null_on_empty: false,
            batch: false,
            batch_size: 10_000,
            observer: None,
            map: identity_map(),
            seed: Box::new(Vec::new),
            reducer: append_reducer(),
            batch_execution: identity_batch_execution(),
            legacy_transform: false,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, O> ParseOptions<A, O>
where
    A: Send + 'static,
    O: Send + 'static,
{
    /// Set the per-record map callback, applied before the reducer.
    ///
    /// Returning `Ok(None)` drops the record silently; an error drops it and is
    /// recorded against the record's line.
    pub fn map<F, Fut>(mut self, mut f: F) -> Self
    where
        F: FnMut(Record) -> Fut + Send + 'static,
        Fut: Future<Output = CallbackResult<Option<Record>>> + Send + 'static,
    {
        self.map = Box::new(move |record| f(record).boxed());
        self
    }

    /// Replace the accumulator: `seed` produces a fresh accumulator (at stream start
    /// and after every batch flush) and `reducer` folds each mapped record in. The
    /// reducer's third argument is the 1-based index of the record among successfully
    /// processed records.
    ///
    /// Resets batch execution to the identity, so call [`Self::batch_execution`]
    /// afterwards if batches need post-processing.
    pub fn fold<B, S, F, Fut>(self, seed: S, mut reducer: F) -> ParseOptions<B, B>
    where
        B: Send + 'static,
        S: FnMut() -> B + Send + 'static,
        F: FnMut(B, Record, u64) -> Fut + Send + 'static,
        Fut: Future<Output = Folded<B>> + Send + 'static,
    {
        ParseOptions {
            delimiter: self.delimiter,
            quote: self.quote,
            header: self.header,
            columns: self.columns,
            detail: self.detail,
            null_on_empty: self.null_on_empty,
            batch: self.batch,
            batch_size: self.batch_size,
            observer: self.observer,
            map: self.map,
            seed: Box::new(seed),
            reducer: Box::new(move |acc, record, index| reducer(acc, record, index).boxed()),
            batch_execution: identity_batch_execution(),
            legacy_transform: false,
        }
    }

    /// Set the batch-execution callback, invoked with an accumulator snapshot every
    /// time a batch fills (and once more for a trailing partial batch).
    ///
    /// Returning `Ok(None)` contributes no output entry; an error is recorded and the
    /// next batch proceeds.
    pub fn batch_execution<P, F, Fut>(self, mut f: F) -> ParseOptions<A, P>
    where
        P: Send + 'static,
        F: FnMut(A) -> Fut + Send + 'static,
        Fut: Future<Output = CallbackResult<Option<P>>> + Send + 'static,
    {
        ParseOptions {
            delimiter: self.delimiter,
            quote: self.quote,
            header: self.header,
            columns: self.columns,
            detail: self.detail,
            null_on_empty: self.null_on_empty,
            batch: self.batch,
            batch_size: self.batch_size,
            observer: self.observer,
            map: self.map,
            seed: self.seed,
            reducer: self.reducer,
            batch_execution: Box::new(move |acc| f(acc).boxed()),
            legacy_transform: self.legacy_transform,
        }
    }

    /// Attach an observer for parse events.
    pub fn observer(mut self, observer: Arc<dyn ParseObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl<O> ParseOptions<Vec<Record>, O>
where
    O: Send + 'static,
{
    /// Legacy alternate pipeline: transform each record and buffer the results.
    ///
    /// Transformed records are appended to the accumulator (a `Vec<Record>`);
    /// `Ok(None)` drops the record silently and failures are recorded without a line
    /// number. Replaces any map callback and restores the collecting reducer.
    pub fn transform<F, Fut>(mut self, mut f: F) -> Self
    where
        F: FnMut(Record) -> Fut + Send + 'static,
        Fut: Future<Output = CallbackResult<Option<Record>>> + Send + 'static,
    {
        self.map = Box::new(move |record| f(record).boxed());
        self.seed = Box::new(Vec::new);
        self.reducer = append_reducer();
        self.legacy_transform = true;
        self
    }
}

impl<A, O> fmt::Debug for ParseOptions<A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("delimiter", &self.delimiter)
            .field("quote", &self.quote)
            .field("header", &self.header)
            .field("columns", &self.columns)
            .field("detail", &self.detail)
            .field("null_on_empty", &self.null_on_empty)
            .field("batch", &self.batch)
            .field("batch_size", &self.batch_size)
            .field("observer_set", &self.observer.is_some())
            .field("legacy_transform", &self.legacy_transform)
            .finish()
    }
}

fn identity_map() -> MapFn {
    Box::new(|record| ready(Ok(Some(record))).boxed())
}

fn append_reducer() -> ReducerFn<Vec<Record>> {
    Box::new(|mut acc, record, _index| {
        acc.push(record);
        ready(Folded::Next(acc)).boxed()
    })
}

fn identity_batch_execution<A: Send + 'static>() -> BatchExecutionFn<A, A> {
    Box::new(|acc| ready(Ok(Some(acc))).boxed())
}
