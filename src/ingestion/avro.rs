//! Avro object container file decoding.
//!
//! The container carries its own writer schema, which drives decoding. The configured schema is
//! only checked against it: every field that resolves to a primitive type must be present.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;

use apache_avro::types::Value as AvroValue;

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::schema::Schema;
use crate::types::{Row, Value};

/// Lazy Avro OCF row decoder.
///
/// The header is read when the decoder is created; data blocks are read on demand.
pub struct AvroRowReader<R: Read> {
    rows: apache_avro::Reader<'static, R>,
    record: usize,
    done: bool,
}

impl<R: Read> AvroRowReader<R> {
    pub fn new(reader: R, schema: &Schema) -> RecordFilterResult<Self> {
        let rows = apache_avro::Reader::new(reader)?;

        let writer_schema = Schema::parse(&rows.writer_schema().canonical_form())?;
        let available: HashSet<&str> = writer_schema.field_names().collect();
        for field in &schema.fields {
            if field.resolve().is_ok() && !available.contains(field.name.as_str()) {
                return Err(RecordFilterError::invalid_schema(format!(
                    "missing required column '{}' in avro writer schema '{}'",
                    field.name, writer_schema.name
                )));
            }
        }

        Ok(Self {
            rows,
            record: 0,
            done: false,
        })
    }

    fn decode(&self, value: AvroValue) -> RecordFilterResult<Row> {
        match value {
            AvroValue::Record(fields) => fields
                .into_iter()
                .map(|(name, v)| {
                    let value = convert_avro_value(self.record, &name, v)?;
                    Ok::<_, RecordFilterError>((name, value))
                })
                .collect(),
            other => Err(RecordFilterError::Decode {
                message: format!("record {} is not an avro record: {other:?}", self.record),
            }),
        }
    }
}

impl<R: Read> Iterator for AvroRowReader<R> {
    type Item = RecordFilterResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.rows.next()? {
            Ok(value) => {
                self.record += 1;
                self.decode(value)
            }
            Err(e) => Err(RecordFilterError::from(e)),
        };
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

/// Map a decoded Avro value onto [`Value`].
///
/// Logical types keep their underlying primitive (`date` is an `int`, `timestamp-millis` a
/// `long`), enums become their symbol and unions their selected branch.
fn convert_avro_value(record: usize, column: &str, v: AvroValue) -> RecordFilterResult<Value> {
    Ok(match v {
        AvroValue::Null => Value::Null,
        AvroValue::Boolean(b) => Value::Bool(b),
        AvroValue::Int(v) | AvroValue::Date(v) | AvroValue::TimeMillis(v) => Value::Int32(v),
        AvroValue::Long(v)
        | AvroValue::TimeMicros(v)
        | AvroValue::TimestampMillis(v)
        | AvroValue::TimestampMicros(v) => Value::Int64(v),
        AvroValue::Float(v) => Value::Float32(v),
        AvroValue::Double(v) => Value::Float64(v),
        AvroValue::String(s) | AvroValue::Enum(_, s) => Value::String(s),
        AvroValue::Uuid(u) => Value::String(u.to_string()),
        AvroValue::Bytes(b) | AvroValue::Fixed(_, b) => Value::Bytes(b),
        AvroValue::Union(_, inner) => convert_avro_value(record, column, *inner)?,
        AvroValue::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_avro_value(record, column, item))
                .collect::<RecordFilterResult<_>>()?,
        ),
        AvroValue::Map(entries) => Value::Map(convert_entries(record, column, entries)?),
        AvroValue::Record(fields) => Value::Map(convert_entries(record, column, fields)?),
        other => {
            return Err(RecordFilterError::invalid_input(
                column,
                format!("record {record}: unsupported avro value {other:?}"),
            ));
        }
    })
}

fn convert_entries<I>(
    record: usize,
    column: &str,
    entries: I,
) -> RecordFilterResult<BTreeMap<String, Value>>
where
    I: IntoIterator<Item = (String, AvroValue)>,
{
    entries
        .into_iter()
        .map(|(k, v)| Ok::<_, RecordFilterError>((k, convert_avro_value(record, column, v)?)))
        .collect()
}
