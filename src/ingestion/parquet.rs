//! Parquet decoding.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use parquet::file::reader::{ChunkReader, FileReader};
use parquet::file::serialized_reader::SerializedFileReader;
use parquet::record::reader::RowIter;
use parquet::record::Field;

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::schema::Schema;
use crate::types::{Row, Value};

/// Lazy Parquet row decoder built on the record API (`RowIter`).
///
/// Notes:
/// - Validates that every resolvable schema field exists as a Parquet leaf column
/// - Row groups are read on demand; only the current record is materialized
pub struct ParquetRowReader {
    rows: RowIter<'static>,
    record: usize,
    done: bool,
}

impl ParquetRowReader {
    pub fn open(path: impl AsRef<Path>, schema: &Schema) -> RecordFilterResult<Self> {
        let reader = SerializedFileReader::<File>::try_from(path.as_ref())?;

        let available_columns = parquet_leaf_column_paths(&reader);
        for field in &schema.fields {
            if field.resolve().is_ok() && !available_columns.contains(field.name.as_str()) {
                return Err(RecordFilterError::invalid_schema(format!(
                    "missing required column '{}'",
                    field.name
                )));
            }
        }

        Ok(Self {
            rows: reader.into_iter(),
            record: 0,
            done: false,
        })
    }

    fn decode(&self, row: &parquet::record::Row) -> RecordFilterResult<Row> {
        let mut out = Row::new();
        for (name, field) in row.get_column_iter() {
            out.insert(name.as_str(), convert_parquet_field(self.record, name, field)?);
        }
        Ok(out)
    }
}

impl Iterator for ParquetRowReader {
    type Item = RecordFilterResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.rows.next()? {
            Ok(row) => {
                self.record += 1;
                self.decode(&row)
            }
            Err(e) => Err(RecordFilterError::from(e)),
        };
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

fn parquet_leaf_column_paths<R: ChunkReader + 'static>(
    reader: &SerializedFileReader<R>,
) -> HashSet<String> {
    reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .columns()
        .iter()
        .map(|c| c.path().string())
        .collect()
}

fn convert_parquet_field(record: usize, column: &str, f: &Field) -> RecordFilterResult<Value> {
    match f {
        Field::Null => Ok(Value::Null),
        Field::Bool(b) => Ok(Value::Bool(*b)),
        Field::Byte(v) => Ok(Value::Int32(i32::from(*v))),
        Field::Short(v) => Ok(Value::Int32(i32::from(*v))),
        Field::Int(v) | Field::Date(v) => Ok(Value::Int32(*v)),
        Field::Long(v) | Field::TimestampMillis(v) | Field::TimestampMicros(v) => {
            Ok(Value::Int64(*v))
        }
        Field::Float(v) => Ok(Value::Float32(*v)),
        Field::Double(v) => Ok(Value::Float64(*v)),
        Field::Str(s) => Ok(Value::String(s.clone())),
        Field::Bytes(b) => Ok(Value::Bytes(b.data().to_vec())),
        other => Err(RecordFilterError::invalid_input(
            column,
            format!("record {record}: unsupported parquet value '{other}'"),
        )),
    }
}
