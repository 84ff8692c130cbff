//! Record assembly: header detection and column mapping.
//!
//! Column configuration starts either unresolved (waiting for the first row when
//! `header` is on), fixed to caller-supplied names, or absent (raw rows). The state is
//! private to one parse, so a shared options value never leaks resolved columns between
//! runs.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::options::Columns;
use super::scanner::RawRecord;
use crate::types::{Field, Record, RecordData};

/// Result of assembling one raw record.
pub(crate) enum Assembled {
    /// The record was a header row and has been consumed; these are the column names
    /// now in effect.
    HeaderConsumed(Vec<String>),
    Record(Record),
}

enum ColumnState {
    /// `header` is on; the first row will become the column names.
    AwaitingHeader,
    /// Column names are fixed; records are emitted as mappings.
    Named(Vec<String>),
    /// No column mapping; records are emitted as raw rows.
    Raw,
}

pub(crate) struct Assembler {
    state: ColumnState,
}

impl Assembler {
    pub(crate) fn new(header: bool, columns: &Columns) -> Self {
        let state = if header {
            ColumnState::AwaitingHeader
        } else {
            match columns {
                Columns::Names(names) if !names.is_empty() => ColumnState::Named(names.clone()),
                _ => ColumnState::Raw,
            }
        };
        Self { state }
    }

    pub(crate) fn assemble(&mut self, raw: RawRecord) -> Assembled {
        match &self.state {
            ColumnState::AwaitingHeader => {
                let names: Vec<String> = raw
                    .fields
                    .iter()
                    .map(|field| field.as_str().unwrap_or("").to_string())
                    .collect();
                self.state = ColumnState::Named(names.clone());
                Assembled::HeaderConsumed(names)
            }
            ColumnState::Named(names) if raw.line == 1 && header_matches(names, &raw.fields) => {
                Assembled::HeaderConsumed(names.clone())
            }
            ColumnState::Named(names) => {
                let data = RecordData::Mapped(
                    names.iter().cloned().zip(raw.fields).collect(),
                );
                Assembled::Record(Record {
                    line: raw.line,
                    raw: raw.raw,
                    data,
                })
            }
            ColumnState::Raw => Assembled::Record(Record {
                line: raw.line,
                raw: raw.raw,
                data: RecordData::Row(raw.fields),
            }),
        }
    }
}

/// Position-by-position header match. Text values compare case- and
/// accent-insensitively; a null value never matches a column name.
fn header_matches(names: &[String], fields: &[Field]) -> bool {
    names.len() == fields.len()
        && names.iter().zip(fields).all(|(name, field)| match field {
            Field::Text(value) => fold_key(name) == fold_key(value),
            Field::Null => false,
        })
}

/// NFD-decompose, drop combining marks, lowercase.
fn fold_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
