//! Core data model: parsed fields, assembled records and the terminal result.
//!
//! Records serialize to the shapes downstream consumers expect from CSV tooling: plain
//! rows become JSON arrays, column-mapped records become JSON objects, and detail-mode
//! records become `{"line": .., "raw": .., "data": ..}` objects.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ParseFailure;

/// One parsed field value.
///
/// `Null` is only produced when `null_on_empty` is enabled and an unquoted field is
/// empty (or whitespace-only). An explicitly quoted empty field (`""`) stays
/// `Text("")`, so the two cases remain distinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Missing/empty value.
    Null,
    /// Field text after quote processing, unmodified otherwise (no trimming).
    Text(String),
}

impl Field {
    /// Returns the field text, or `None` for a null field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Null => None,
            Field::Text(s) => Some(s.as_str()),
        }
    }

    /// Returns `true` for a null field.
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Text(s)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Text(s.to_string())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Null => serializer.serialize_unit(),
            Field::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// The emitted shape of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    /// Raw ordered field values (no column mapping configured).
    Row(Vec<Field>),
    /// Ordered column-name/value pairs. Extra fields beyond the column count are
    /// dropped; columns with no corresponding field are absent.
    Mapped(Vec<(String, Field)>),
}

impl RecordData {
    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        match self {
            RecordData::Row(fields) => fields.len(),
            RecordData::Mapped(pairs) => pairs.len(),
        }
    }

    /// Returns `true` if the record holds no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for RecordData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordData::Row(fields) => fields.serialize(serializer),
            RecordData::Mapped(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (name, value) in pairs {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

/// One assembled record.
///
/// `line` is the 1-based physical line on which the record started (multi-line quoted
/// fields span several physical lines). `raw` holds the verbatim source text of the
/// record, excluding its line terminator, and is only captured in detail mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: u64,
    pub raw: Option<String>,
    pub data: RecordData,
}

impl Record {
    /// Look up a field by column name. Always `None` for unmapped rows.
    pub fn get(&self, name: &str) -> Option<&Field> {
        match &self.data {
            RecordData::Row(_) => None,
            RecordData::Mapped(pairs) => pairs
                .iter()
                .find(|(column, _)| column == name)
                .map(|(_, value)| value),
        }
    }

    /// Iterate the record's field values in order, whatever the shape.
    pub fn values(&self) -> impl Iterator<Item = &Field> {
        let (row, mapped) = match &self.data {
            RecordData::Row(fields) => (Some(fields.iter()), None),
            RecordData::Mapped(pairs) => (None, Some(pairs.iter().map(|(_, value)| value))),
        };
        row.into_iter().flatten().chain(mapped.into_iter().flatten())
    }

    /// Consume the record, keeping only its data shape.
    pub fn into_data(self) -> RecordData {
        self.data
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.raw {
            Some(raw) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("line", &self.line)?;
                map.serialize_entry("raw", raw)?;
                map.serialize_entry("data", &self.data)?;
                map.end()
            }
            None => self.data.serialize(serializer),
        }
    }
}

/// The result data, depending on whether batching was enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchData<A, O> {
    /// Batching disabled: the final accumulator.
    Accumulator(A),
    /// Batching enabled: non-skipped batch-execution outputs, in input order.
    Batches(Vec<O>),
}

/// Terminal value of a parse, delivered exactly once when the stream ends.
#[derive(Debug)]
pub struct BatchResult<A, O> {
    /// Count of records successfully folded into an accumulator.
    pub total_records: u64,
    /// Final accumulator or collected batch outputs.
    pub data: BatchData<A, O>,
    /// Recovered callback failures, in occurrence order.
    pub errors: Vec<ParseFailure>,
}

impl<A, O> BatchResult<A, O> {
    /// Returns the final accumulator, or `None` if batching was enabled.
    pub fn into_accumulator(self) -> Option<A> {
        match self.data {
            BatchData::Accumulator(acc) => Some(acc),
            BatchData::Batches(_) => None,
        }
    }

    /// Returns the collected batch outputs, or `None` if batching was disabled.
    pub fn into_batches(self) -> Option<Vec<O>> {
        match self.data {
            BatchData::Accumulator(_) => None,
            BatchData::Batches(outputs) => Some(outputs),
        }
    }

    /// Returns `true` if any callback failure was recovered during the parse.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
