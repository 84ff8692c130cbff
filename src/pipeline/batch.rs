//! Batch flushing and result aggregation.
//!
//! With batching enabled, the accumulator is snapshotted and handed to the
//! batch-execution callback every `batch_size` folded records and once more at end of
//! stream if a partial batch remains. Execution happens inline, so the upstream source
//! is not consumed faster than batches complete.

use crate::error::ParseFailure;
use crate::pipeline::{BatchExecutionFn, SeedFn};
use crate::types::{BatchData, BatchResult};

/// Running totals and recovered failures for one parse.
pub(crate) struct Aggregator {
    pub(crate) total_records: u64,
    pub(crate) errors: Vec<ParseFailure>,
}

impl Aggregator {
    pub(crate) fn new() -> Self {
        Self {
            total_records: 0,
            errors: Vec::new(),
        }
    }

    pub(crate) fn into_result<A, O>(self, data: BatchData<A, O>) -> BatchResult<A, O> {
        BatchResult {
            total_records: self.total_records,
            data,
            errors: self.errors,
        }
    }
}

/// Report of one flush, for observer events.
pub(crate) struct FlushReport {
    pub(crate) records: u64,
    pub(crate) failed: bool,
}

/// Groups folded records into size-bounded batches and drives batch execution.
pub(crate) struct Batcher<A, O> {
    enabled: bool,
    size: usize,
    seed: SeedFn<A>,
    execute: BatchExecutionFn<A, O>,
    acc: Option<A>,
    in_batch: usize,
    outputs: Vec<O>,
}

impl<A, O> Batcher<A, O> {
    pub(crate) fn new(
        enabled: bool,
        size: usize,
        mut seed: SeedFn<A>,
        execute: BatchExecutionFn<A, O>,
    ) -> Self {
        let acc = Some(seed());
        Self {
            enabled,
            size,
            seed,
            execute,
            acc,
            in_batch: 0,
            outputs: Vec::new(),
        }
    }

    pub(crate) fn take_accumulator(&mut self) -> A {
        // Safe: the accumulator is only absent inside flush(), which restores it.
        self.acc.take().expect("accumulator in place")
    }

    pub(crate) fn put_accumulator(&mut self, acc: A) {
        self.acc = Some(acc);
    }

    /// Called after each successful fold. Flushes when the batch is full.
    pub(crate) async fn on_record_folded(
        &mut self,
        errors: &mut Vec<ParseFailure>,
    ) -> Option<FlushReport> {
        if !self.enabled {
            return None;
        }
        self.in_batch += 1;
        if self.in_batch >= self.size {
            Some(self.flush(errors).await)
        } else {
            None
        }
    }

    async fn flush(&mut self, errors: &mut Vec<ParseFailure>) -> FlushReport {
        // Safe: see take_accumulator.
        let snapshot = self.acc.take().expect("accumulator in place");
        self.acc = Some((self.seed)());
        let records = self.in_batch as u64;
        self.in_batch = 0;

        match (self.execute)(snapshot).await {
            Ok(Some(output)) => {
                self.outputs.push(output);
                FlushReport {
                    records,
                    failed: false,
                }
            }
            Ok(None) => FlushReport {
                records,
                failed: false,
            },
            Err(error) => {
                errors.push(ParseFailure { line: None, error });
                FlushReport {
                    records,
                    failed: true,
                }
            }
        }
    }

    /// Flush any partial batch and produce the result data.
    pub(crate) async fn finish(
        mut self,
        errors: &mut Vec<ParseFailure>,
    ) -> (BatchData<A, O>, Option<FlushReport>) {
        if self.enabled {
            let report = if self.in_batch > 0 {
                Some(self.flush(errors).await)
            } else {
                None
            };
            (BatchData::Batches(self.outputs), report)
        } else {
            // Safe: see take_accumulator.
            let acc = self.acc.take().expect("accumulator in place");
            (BatchData::Accumulator(acc), None)
        }
    }
}
