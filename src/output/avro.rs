//! Avro object container file encoding.

use std::collections::HashMap;
use std::io::Write;

use apache_avro::types::Value as AvroValue;
use apache_avro::Writer;

use crate::error::RecordFilterResult;
use crate::schema::Schema;
use crate::types::{Row, Value};

use super::{EncodeOptions, RowSink};

/// Writes rows as records of the schema's Avro form, one container block per row.
///
/// Absent fields are written as null, fields not in the schema are dropped, and each value is
/// resolved against the schema before it is appended (a string for an enum symbol, a map for a
/// nested record, a bare value for its union branch). A row the schema cannot hold fails with an
/// Avro error and nothing of it is written.
pub struct AvroRowWriter<'a, W: Write> {
    writer: Writer<'a, W>,
    schema: &'a apache_avro::Schema,
    field_order: Vec<String>,
}

impl<'a, W: Write> AvroRowWriter<'a, W> {
    pub fn new(out: W, schema: &'a Schema, options: &EncodeOptions) -> RecordFilterResult<Self> {
        let avro = schema.avro()?;
        Ok(Self {
            writer: Writer::with_codec(avro, out, options.codec.to_avro_codec()),
            schema: avro,
            field_order: schema.field_names().map(str::to_string).collect(),
        })
    }
}

impl<W: Write> RowSink for AvroRowWriter<'_, W> {
    fn write_row(&mut self, row: &Row) -> RecordFilterResult<()> {
        let record = AvroValue::Record(
            self.field_order
                .iter()
                .map(|name| (name.clone(), row.get(name).map_or(AvroValue::Null, to_avro)))
                .collect(),
        );
        let resolved = record.resolve(self.schema)?;
        self.writer.append(resolved)?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> RecordFilterResult<()> {
        let mut out = self.writer.into_inner()?;
        out.flush()?;
        Ok(())
    }
}

fn to_avro(value: &Value) -> AvroValue {
    match value {
        Value::Null => AvroValue::Null,
        Value::String(s) => AvroValue::String(s.clone()),
        Value::Int32(v) => AvroValue::Int(*v),
        Value::Int64(v) => AvroValue::Long(*v),
        Value::Float32(v) => AvroValue::Float(*v),
        Value::Float64(v) => AvroValue::Double(*v),
        Value::Bool(v) => AvroValue::Boolean(*v),
        Value::Bytes(b) => AvroValue::Bytes(b.clone()),
        Value::Array(items) => AvroValue::Array(items.iter().map(to_avro).collect()),
        Value::Map(entries) => AvroValue::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), to_avro(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::AvroRowWriter;
    use crate::error::RecordFilterError;
    use crate::ingestion::AvroRowReader;
    use crate::output::{Codec, EncodeOptions, RowSink};
    use crate::schema::Schema;
    use crate::types::{Row, Value};

    fn schema() -> Schema {
        Schema::parse(
            r#"{"type":"record","name":"E","fields":[
                {"name":"status","type":["string","null"]},
                {"name":"total","type":"long"},
                {"name":"kind","type":{"type":"enum","name":"Kind","symbols":["A","B"]}}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn rows_resolve_against_the_schema() {
        let schema = schema();
        let mut buf = Vec::new();
        {
            let mut w = AvroRowWriter::new(&mut buf, &schema, &EncodeOptions::default()).unwrap();
            w.write_row(
                &Row::new()
                    .with("status", "active")
                    .with("total", 7_i32)
                    .with("kind", "B")
                    .with("extra", true),
            )
            .unwrap();
            w.write_row(&Row::new().with("total", 8_i64).with("kind", "A"))
                .unwrap();
            Box::new(w).finish().unwrap();
        }

        let rows: Vec<Row> = AvroRowReader::new(buf.as_slice(), &schema)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("status"), Some(&Value::from("active")));
        assert_eq!(rows[0].get("total"), Some(&Value::Int64(7)));
        assert_eq!(rows[0].get("kind"), Some(&Value::from("B")));
        assert_eq!(rows[0].get("extra"), None);
        assert_eq!(rows[1].get("status"), Some(&Value::Null));
    }

    #[test]
    fn row_outside_the_schema_is_rejected() {
        let schema = schema();
        let mut buf = Vec::new();
        let mut w = AvroRowWriter::new(
            &mut buf,
            &schema,
            &EncodeOptions {
                block_length: 1,
                codec: Codec::Deflate,
            },
        )
        .unwrap();
        let err = w
            .write_row(&Row::new().with("total", 1_i64).with("kind", "C"))
            .unwrap_err();
        assert!(matches!(err, RecordFilterError::Avro(_)));
        let err = w.write_row(&Row::new().with("kind", "A")).unwrap_err();
        assert!(matches!(err, RecordFilterError::Avro(_)));
    }

    #[test]
    fn empty_run_is_a_valid_container() {
        let schema = schema();
        let mut buf = Vec::new();
        Box::new(AvroRowWriter::new(&mut buf, &schema, &EncodeOptions::default()).unwrap())
            .finish()
            .unwrap();
        assert!(buf.starts_with(b"Obj\x01"));
        assert_eq!(AvroRowReader::new(buf.as_slice(), &schema).unwrap().count(), 0);
    }
}
