//! CSV encoding.

use std::io::Write;

use crate::error::RecordFilterResult;
use crate::schema::Schema;
use crate::types::{Row, Value};

use super::RowSink;

/// Writes a header row from the schema's field order, then one record per row.
///
/// Fields not declared in the schema are dropped; absent and null fields become empty cells.
/// Bytes, arrays and maps are written as their JSON text.
pub struct CsvRowWriter<W: Write> {
    out: csv::Writer<W>,
    columns: Vec<String>,
}

impl<W: Write> CsvRowWriter<W> {
    pub fn new(out: W, schema: &Schema) -> RecordFilterResult<Self> {
        let columns: Vec<String> = schema.field_names().map(str::to_string).collect();
        let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(out);
        out.write_record(&columns)?;
        out.flush()?;
        Ok(Self { out, columns })
    }
}

fn cell_text(value: Option<&Value>) -> RecordFilterResult<String> {
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Int32(v)) => v.to_string(),
        Some(Value::Int64(v)) => v.to_string(),
        Some(Value::Float32(v)) => v.to_string(),
        Some(Value::Float64(v)) => v.to_string(),
        Some(Value::Bool(v)) => v.to_string(),
        Some(nested) => serde_json::to_string(nested)?,
    })
}

impl<W: Write> RowSink for CsvRowWriter<W> {
    fn write_row(&mut self, row: &Row) -> RecordFilterResult<()> {
        let record = self
            .columns
            .iter()
            .map(|c| cell_text(row.get(c)))
            .collect::<RecordFilterResult<Vec<_>>>()?;
        self.out.write_record(&record)?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> RecordFilterResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
