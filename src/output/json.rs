//! NDJSON encoding.

use std::io::Write;

use crate::error::RecordFilterResult;
use crate::schema::Schema;
use crate::types::{Row, Value};

use super::RowSink;

/// Writes one JSON object per line.
///
/// Fields declared in the schema come first, in declaration order; any other fields follow in
/// name order. Absent fields are omitted, [`Value::Null`] and non-finite floats are written as
/// `null`, arrays and maps as nested JSON.
pub struct JsonRowWriter<W: Write> {
    out: W,
    field_order: Vec<String>,
}

impl<W: Write> JsonRowWriter<W> {
    pub fn new(out: W, schema: &Schema) -> Self {
        Self {
            out,
            field_order: schema.field_names().map(str::to_string).collect(),
        }
    }
}

impl<W: Write> RowSink for JsonRowWriter<W> {
    fn write_row(&mut self, row: &Row) -> RecordFilterResult<()> {
        let mut extras: Vec<(&str, &Value)> = row
            .iter()
            .filter(|(name, _)| !self.field_order.iter().any(|f| f.as_str() == *name))
            .collect();
        extras.sort_by(|a, b| a.0.cmp(b.0));

        let declared = self
            .field_order
            .iter()
            .filter_map(|name| row.get(name).map(|v| (name.as_str(), v)));

        self.out.write_all(b"{")?;
        for (i, (name, value)) in declared.chain(extras).enumerate() {
            if i > 0 {
                self.out.write_all(b",")?;
            }
            write_field(&mut self.out, name, value)?;
        }
        self.out.write_all(b"}\n")?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> RecordFilterResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

fn write_field<W: Write>(out: &mut W, name: &str, value: &Value) -> RecordFilterResult<()> {
    serde_json::to_writer(&mut *out, name)?;
    out.write_all(b":")?;
    serde_json::to_writer(&mut *out, value)?;
    Ok(())
}
