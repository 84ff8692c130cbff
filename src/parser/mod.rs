//! Streaming CSV parsing: scanner, record assembly, configuration and drivers.
//!
//! Most callers should use [`parse`] (byte sources) or [`parse_str`] (in-memory text);
//! [`Parser`] is the chunk-level core for callers that already have decoded text
//! arriving incrementally.

mod assembler;
mod driver;
mod options;
mod scanner;

pub use driver::{Parser, parse, parse_str};
pub use options::{Columns, ParseOptions};
