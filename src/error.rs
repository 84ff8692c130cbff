use std::fmt;

use thiserror::Error;

/// Boxed error type for user-supplied callbacks.
///
/// Map, transform, reducer and batch-execution callbacks can fail with any error type;
/// failures are collected into [`crate::types::BatchResult::errors`] rather than aborting
/// the parse.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by user-supplied callbacks.
pub type CallbackResult<T> = Result<T, BoxError>;

/// Convenience result type for the fallible (byte-source) entry point.
pub type ParseResult<T> = Result<T, ParseError>;

/// Fatal, operation-level parse failure.
///
/// Only the byte source itself can fail a parse. Everything a user callback does wrong is
/// recovered into [`ParseFailure`] entries and the stream keeps going.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Underlying I/O error from the byte source.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream is not valid UTF-8.
    #[error("invalid utf-8 in byte stream at offset {offset}")]
    Utf8 { offset: u64 },
}

/// One recovered callback failure.
///
/// `line` is the 1-based line on which the failing record started, when known. Failures
/// from the legacy transform pipeline and from batch execution are untagged.
#[derive(Debug)]
pub struct ParseFailure {
    pub line: Option<u64>,
    pub error: BoxError,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "record at line {line}: {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for ParseFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}
