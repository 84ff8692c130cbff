//! Character-level scanner.
//!
//! A feed-based state machine over decoded text chunks, scanning one character at a time
//! with a single character of lookahead. Only the quote character and `\r` ever consult
//! the lookahead, so when a chunk ends in one of those the character is held back and
//! re-injected at the head of the next chunk; chunk boundaries can therefore never
//! change what is recognized.
//!
//! The scanner emits [`RawRecord`]s and nothing else. Header handling, column mapping
//! and detail wrapping happen in the assembler.

use crate::types::Field;

/// One scanned record, before header detection and shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawRecord {
    /// 1-based physical line on which the record started.
    pub(crate) line: u64,
    /// Verbatim source text of the record, excluding its line terminator.
    /// Only captured when detail mode is on.
    pub(crate) raw: Option<String>,
    pub(crate) fields: Vec<Field>,
}

pub(crate) struct Scanner {
    delimiter: char,
    quote: char,
    null_on_empty: bool,
    capture_raw: bool,

    in_quote: bool,
    /// Trailing quote/CR held back at a chunk boundary for lookahead.
    held: Option<char>,
    /// Current physical line, 1-based. Quoted line endings advance it too.
    line: u64,
    /// Line on which the in-progress record started.
    record_line: u64,
    field: String,
    /// The in-progress field contained an explicit empty quoted pair (`""`),
    /// which keeps it from becoming null under `null_on_empty`.
    field_explicit_empty: bool,
    fields: Vec<Field>,
    raw: String,
}

impl Scanner {
    pub(crate) fn new(delimiter: char, quote: char, null_on_empty: bool, capture_raw: bool) -> Self {
        Self {
            delimiter,
            quote,
            null_on_empty,
            capture_raw,
            in_quote: false,
            held: None,
            line: 1,
            record_line: 1,
            field: String::new(),
            field_explicit_empty: false,
            fields: Vec::new(),
            raw: String::new(),
        }
    }

    pub(crate) fn feed(&mut self, chunk: &str, out: &mut Vec<RawRecord>) {
        self.scan(chunk, false, out);
    }

    /// Signal end of input. An unterminated final record is emitted exactly once.
    pub(crate) fn finish(&mut self, out: &mut Vec<RawRecord>) {
        self.scan("", true, out);
        if !self.field.is_empty() || !self.fields.is_empty() {
            self.end_field();
            self.end_record(out);
        }
    }

    fn scan(&mut self, chunk: &str, eof: bool, out: &mut Vec<RawRecord>) {
        let mut chars = self.held.take().into_iter().chain(chunk.chars()).peekable();

        while let Some(c) = chars.next() {
            let next = chars.peek().copied();

            if next.is_none() && !eof && (c == self.quote || c == '\r') {
                self.held = Some(c);
                return;
            }

            if c == self.quote && self.in_quote && next == Some(self.quote) {
                // Escaped quote: one literal quote in the field, both chars verbatim.
                chars.next();
                self.field.push(self.quote);
                self.push_raw(self.quote);
                self.push_raw(self.quote);
                continue;
            }

            if c == self.quote {
                if !self.in_quote && next == Some(self.quote) {
                    self.field_explicit_empty = true;
                }
                self.in_quote = !self.in_quote;
                self.push_raw(c);
                continue;
            }

            if c == self.delimiter && !self.in_quote {
                self.end_field();
                self.push_raw(c);
                continue;
            }

            if c == '\r' && next == Some('\n') {
                chars.next();
                if self.in_quote {
                    self.field.push_str("\r\n");
                    self.push_raw('\r');
                    self.push_raw('\n');
                    self.line += 1;
                } else {
                    self.end_field();
                    self.end_record(out);
                    self.line += 1;
                    self.record_line = self.line;
                }
                continue;
            }

            if c == '\n' || c == '\r' {
                if self.in_quote {
                    self.field.push(c);
                    self.push_raw(c);
                    self.line += 1;
                } else {
                    self.end_field();
                    self.end_record(out);
                    self.line += 1;
                    self.record_line = self.line;
                }
                continue;
            }

            self.field.push(c);
            self.push_raw(c);
        }
    }

    fn push_raw(&mut self, c: char) {
        if self.capture_raw {
            self.raw.push(c);
        }
    }

    fn end_field(&mut self) {
        let value = std::mem::take(&mut self.field);
        if self.null_on_empty && !self.field_explicit_empty && value.trim().is_empty() {
            self.fields.push(Field::Null);
        } else {
            self.fields.push(Field::Text(value));
        }
        self.field_explicit_empty = false;
    }

    fn end_record(&mut self, out: &mut Vec<RawRecord>) {
        out.push(RawRecord {
            line: self.record_line,
            raw: self.capture_raw.then(|| std::mem::take(&mut self.raw)),
            fields: std::mem::take(&mut self.fields),
        });
    }
}
