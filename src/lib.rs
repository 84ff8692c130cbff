//! `csv-batch` is a streaming CSV parser for large inputs: records are produced
//! incrementally from a character stream and folded through a user-supplied async
//! pipeline, optionally in size-bounded batches. Input is never fully buffered:
//! memory use is bounded by batch size, not file size.
//!
//! The parser is permissive: it does not reject structural anomalies such as uneven
//! column counts. User callbacks may fail freely; failures are collected into the
//! result (tagged with the record's line number where known) and the stream keeps
//! going. Only the byte source itself can abort a parse.
//!
//! ## Quick example: records as column mappings
//!
//! ```
//! use csv_batch::{parse_str, Field, ParseOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let csv = "id,name\n1,Ada\n2,Grace";
//! let result = parse_str(csv, ParseOptions::new()).await;
//!
//! assert_eq!(result.total_records, 2);
//! let records = result.into_accumulator().unwrap();
//! assert_eq!(records[0].get("name").and_then(Field::as_str), Some("Ada"));
//! # }
//! ```
//!
//! ## Folding records into an accumulator
//!
//! The reducer is awaited per record, strictly in input order; a rejecting fold hands
//! the accumulator back unchanged and the failure is recorded against the record's
//! line:
//!
//! ```
//! use csv_batch::{parse_str, Field, Folded, ParseOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let csv = "year,amount\n2020,34\n2020,not-a-number\n2021,22";
//! let options = ParseOptions::new().fold(
//!     || 0i64,
//!     |acc, record, _index| async move {
//!         let raw = record.get("amount").and_then(Field::as_str).unwrap_or("");
//!         match raw.parse::<i64>() {
//!             Ok(amount) => Folded::Next(acc + amount),
//!             Err(e) => Folded::reject(acc, e),
//!         }
//!     },
//! );
//!
//! let result = parse_str(csv, options).await;
//! assert_eq!(result.total_records, 2);
//! assert_eq!(result.errors[0].line, Some(3));
//! assert_eq!(result.into_accumulator(), Some(56));
//! # }
//! ```
//!
//! ## Batching
//!
//! With `batch` on, the accumulator is snapshotted and handed to the batch-execution
//! callback every `batch_size` folded records (and once more for a trailing partial
//! batch), then reseeded. Execution is awaited inline, so a slow batch naturally
//! backpressures the source:
//!
//! ```
//! use csv_batch::{parse_str, ParseOptions, Record};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let csv = "id\n1\n2\n3";
//! let mut options = ParseOptions::new();
//! options.batch = true;
//! options.batch_size = 2;
//! let options = options.batch_execution(|records: Vec<Record>| async move {
//!     // e.g. insert the batch into a database here
//!     Ok(Some(records.len()))
//! });
//!
//! let result = parse_str(csv, options).await;
//! assert_eq!(result.total_records, 3);
//! assert_eq!(result.into_batches(), Some(vec![2, 1]));
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`parser`]: scanner, record assembly, configuration and the parse drivers
//! - [`pipeline`]: the per-record async map/reduce pipeline and batch flushing
//! - [`types`]: field/record data model and the terminal [`BatchResult`]
//! - [`error`]: fatal errors and recovered callback failures
//! - [`observability`]: observer hooks for parse events

pub mod error;
pub mod observability;
pub mod parser;
pub mod pipeline;
pub mod types;

pub use error::{BoxError, CallbackResult, ParseError, ParseFailure, ParseResult};
pub use observability::{
    CompositeParseObserver, ParseEvent, ParseObserver, StdErrParseObserver,
};
pub use parser::{Columns, ParseOptions, Parser, parse, parse_str};
pub use pipeline::Folded;
pub use types::{BatchData, BatchResult, Field, Record, RecordData};
