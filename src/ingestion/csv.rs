//! CSV decoding.

use std::io::Read;

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::processing::parse_value;
use crate::schema::Schema;
use crate::types::{PrimitiveType, Row, Value};

/// Lazy CSV row decoder.
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain every schema field that resolves to a primitive type (order can
///   differ).
/// - Cells of `string` columns, and of columns not declared in the schema, are kept verbatim
///   (an empty cell is the empty string).
/// - Cells of other columns are trimmed and parsed according to the column's type; an empty
///   cell is [`Value::Null`].
pub struct CsvRowReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    headers: Vec<String>,
    column_types: Vec<Option<PrimitiveType>>,
    done: bool,
}

impl<R: Read> CsvRowReader<R> {
    /// Read the header and validate it against `schema`. Fails before any record is read.
    pub fn new(reader: R, schema: &Schema) -> RecordFilterResult<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        for field in &schema.fields {
            if field.resolve().is_ok() && !headers.iter().any(|h| *h == field.name) {
                return Err(RecordFilterError::invalid_schema(format!(
                    "missing required column '{}'. headers={headers:?}",
                    field.name
                )));
            }
        }

        let column_types = headers
            .iter()
            .map(|h| schema.field(h).and_then(|f| f.resolve().ok()))
            .collect();

        Ok(Self {
            records: rdr.into_records(),
            headers,
            column_types,
            done: false,
        })
    }

    fn decode(&self, record: &csv::StringRecord) -> RecordFilterResult<Row> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let mut row = Row::new();
        for ((name, data_type), raw) in self
            .headers
            .iter()
            .zip(self.column_types.iter())
            .zip(record.iter())
        {
            let value = match data_type {
                None | Some(PrimitiveType::String) => Value::String(raw.to_string()),
                Some(t) => match raw.trim() {
                    "" => Value::Null,
                    cell => parse_value(name, *t, cell).map_err(|e| at_line(e, line))?,
                },
            };
            row.insert(name.as_str(), value);
        }
        Ok(row)
    }
}

fn at_line(err: RecordFilterError, line: u64) -> RecordFilterError {
    match err {
        RecordFilterError::InvalidInput { column, message } => RecordFilterError::InvalidInput {
            column,
            message: format!("line {line}: {message}"),
        },
        other => other,
    }
}

impl<R: Read> Iterator for CsvRowReader<R> {
    type Item = RecordFilterResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.records.next()? {
            Ok(record) => self.decode(&record),
            Err(e) => Err(RecordFilterError::from(e)),
        };
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
