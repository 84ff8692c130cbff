//! Parse drivers.
//!
//! [`Parser`] is the chunk-level core: it consumes already-decoded text chunks and is
//! infallible (every user-callback failure is recovered into the result). [`parse`]
//! wraps it for byte sources, adding incremental UTF-8 decoding. This is the only layer that
//! can fail, and only because the source itself does.

use std::borrow::Cow;
use std::str;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::assembler::{Assembled, Assembler};
use super::options::ParseOptions;
use super::scanner::{RawRecord, Scanner};
use crate::error::{ParseError, ParseResult};
use crate::observability::{ParseEvent, ParseObserver};
use crate::pipeline::batch::{Aggregator, Batcher, FlushReport};
use crate::pipeline::{RecordOutcome, RecordPipeline};
use crate::types::{BatchResult, Record};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Incremental streaming parser over decoded text chunks.
///
/// Feed chunks of any size (including chunks that split quotes, CRLF pairs or records),
/// then call [`Parser::finish`] to flush trailing state and take the result. Chunk
/// boundaries never change what is parsed.
///
/// ```
/// use csv_batch::{Parser, ParseOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut parser = Parser::new(ParseOptions::new());
/// parser.feed("id,name\n1,").await;
/// parser.feed("Ada\n2,Grace").await;
/// let result = parser.finish().await;
/// assert_eq!(result.total_records, 2);
/// # }
/// ```
pub struct Parser<A = Vec<Record>, O = Vec<Record>> {
    scanner: Scanner,
    assembler: Assembler,
    pipeline: RecordPipeline<A>,
    batcher: Batcher<A, O>,
    aggregator: Aggregator,
    observer: Option<Arc<dyn ParseObserver>>,
    scratch: Vec<RawRecord>,
}

impl<A, O> Parser<A, O>
where
    A: Send + 'static,
    O: Send + 'static,
{
    /// Create a parser from options.
    ///
    /// # Panics
    ///
    /// Panics if batching is enabled with `batch_size == 0`.
    pub fn new(options: ParseOptions<A, O>) -> Self {
        assert!(
            !options.batch || options.batch_size > 0,
            "batch_size must be > 0 when batching is enabled"
        );

        let ParseOptions {
            delimiter,
            quote,
            header,
            columns,
            detail,
            null_on_empty,
            batch,
            batch_size,
            observer,
            map,
            seed,
            reducer,
            batch_execution,
            legacy_transform,
        } = options;

        Self {
            scanner: Scanner::new(delimiter, quote, null_on_empty, detail),
            assembler: Assembler::new(header, &columns),
            pipeline: RecordPipeline::new(map, reducer, !legacy_transform),
            batcher: Batcher::new(batch, batch_size, seed, batch_execution),
            aggregator: Aggregator::new(),
            observer,
            scratch: Vec::new(),
        }
    }

    /// Feed one decoded text chunk.
    ///
    /// Completed records are run through the pipeline before this returns, awaiting
    /// every user callback in order; the caller cannot outrun batch execution.
    pub async fn feed(&mut self, chunk: &str) {
        let mut records = std::mem::take(&mut self.scratch);
        self.scanner.feed(chunk, &mut records);
        self.dispatch(&mut records).await;
        self.scratch = records;
    }

    /// Signal end of input, flush trailing state and deliver the result.
    pub async fn finish(mut self) -> BatchResult<A, O> {
        let mut records = std::mem::take(&mut self.scratch);
        self.scanner.finish(&mut records);
        self.dispatch(&mut records).await;

        let Self {
            batcher,
            mut aggregator,
            observer,
            ..
        } = self;

        let (data, report) = batcher.finish(&mut aggregator.errors).await;
        if let Some(report) = report {
            emit_to(&observer, flush_event(report));
        }

        let result = aggregator.into_result(data);
        emit_to(
            &observer,
            ParseEvent::Finished {
                total_records: result.total_records,
                errors: result.errors.len(),
            },
        );
        result
    }

    async fn dispatch(&mut self, records: &mut Vec<RawRecord>) {
        for raw in records.drain(..) {
            match self.assembler.assemble(raw) {
                Assembled::HeaderConsumed(columns) => {
                    self.emit(ParseEvent::HeaderResolved { columns });
                }
                Assembled::Record(record) => {
                    self.emit(ParseEvent::RecordEmitted { line: record.line });

                    let acc = self.batcher.take_accumulator();
                    let next_index = self.aggregator.total_records + 1;
                    let (acc, outcome) = self.pipeline.process(acc, record, next_index).await;
                    self.batcher.put_accumulator(acc);

                    match outcome {
                        RecordOutcome::Reduced => {
                            self.aggregator.total_records += 1;
                            if let Some(report) = self
                                .batcher
                                .on_record_folded(&mut self.aggregator.errors)
                                .await
                            {
                                self.emit(flush_event(report));
                            }
                        }
                        RecordOutcome::Dropped => {}
                        RecordOutcome::Failed(failure) => {
                            self.emit(ParseEvent::RecordFailed { line: failure.line });
                            self.aggregator.errors.push(failure);
                        }
                    }
                }
            }
        }
    }

    fn emit(&self, event: ParseEvent) {
        emit_to(&self.observer, event);
    }
}

fn flush_event(report: FlushReport) -> ParseEvent {
    if report.failed {
        ParseEvent::BatchFailed
    } else {
        ParseEvent::BatchFlushed {
            records: report.records,
        }
    }
}

fn emit_to(observer: &Option<Arc<dyn ParseObserver>>, event: ParseEvent) {
    if let Some(observer) = observer {
        observer.on_event(&event);
    }
}

/// Parse a byte source to completion.
///
/// Bytes are decoded as UTF-8 incrementally; multi-byte sequences split across reads
/// are reassembled, and invalid or truncated input fails the whole operation with
/// [`ParseError::Utf8`]. Source I/O errors abort the parse; no partial result is
/// delivered.
///
/// ```
/// use csv_batch::{parse, ParseOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), csv_batch::ParseError> {
/// let csv: &[u8] = b"id,name\n1,Ada\n2,Grace";
/// let result = parse(csv, ParseOptions::new()).await?;
/// assert_eq!(result.total_records, 2);
/// # Ok(())
/// # }
/// ```
pub async fn parse<R, A, O>(
    mut source: R,
    options: ParseOptions<A, O>,
) -> ParseResult<BatchResult<A, O>>
where
    R: AsyncRead + Unpin,
    A: Send + 'static,
    O: Send + 'static,
{
    let mut parser = Parser::new(options);
    let mut decoder = Utf8Decoder::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let chunk = decoder.decode(&buf[..n])?;
        parser.feed(&chunk).await;
    }
    decoder.finish()?;

    Ok(parser.finish().await)
}

/// Parse an in-memory string to completion. Infallible: only byte sources can fail.
pub async fn parse_str<A, O>(input: &str, options: ParseOptions<A, O>) -> BatchResult<A, O>
where
    A: Send + 'static,
    O: Send + 'static,
{
    let mut parser = Parser::new(options);
    parser.feed(input).await;
    parser.finish().await
}

/// Incremental UTF-8 decoder.
///
/// Holds back an incomplete trailing multi-byte sequence between reads; anything else
/// invalid is a hard error carrying the absolute byte offset.
struct Utf8Decoder {
    pending: Vec<u8>,
    decoded: u64,
}

impl Utf8Decoder {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
            decoded: 0,
        }
    }

    fn decode<'a>(&mut self, input: &'a [u8]) -> ParseResult<Cow<'a, str>> {
        if self.pending.is_empty() {
            match str::from_utf8(input) {
                Ok(text) => {
                    self.decoded += text.len() as u64;
                    Ok(Cow::Borrowed(text))
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if e.error_len().is_some() {
                        return Err(ParseError::Utf8 {
                            offset: self.decoded + valid as u64,
                        });
                    }
                    self.pending.extend_from_slice(&input[valid..]);
                    // Safe: validated up to `valid`.
                    let text = str::from_utf8(&input[..valid]).expect("validated prefix");
                    self.decoded += valid as u64;
                    Ok(Cow::Borrowed(text))
                }
            }
        } else {
            self.pending.extend_from_slice(input);
            match str::from_utf8(&self.pending) {
                Ok(text) => {
                    let owned = text.to_string();
                    self.decoded += owned.len() as u64;
                    self.pending.clear();
                    Ok(Cow::Owned(owned))
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if e.error_len().is_some() {
                        return Err(ParseError::Utf8 {
                            offset: self.decoded + valid as u64,
                        });
                    }
                    // Safe: validated up to `valid`.
                    let owned = str::from_utf8(&self.pending[..valid])
                        .expect("validated prefix")
                        .to_string();
                    self.pending.drain(..valid);
                    self.decoded += valid as u64;
                    Ok(Cow::Owned(owned))
                }
            }
        }
    }

    fn finish(&self) -> ParseResult<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(ParseError::Utf8 {
                offset: self.decoded,
            })
        }
    }
}
