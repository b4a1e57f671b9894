//! Parquet encoding.

use std::io::Write;
use std::sync::Arc;

use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::schema::{Column, Schema};
use crate::types::{PrimitiveType, Row, Value};

use super::{EncodeOptions, RowSink};

/// Buffers rows and writes them as Parquet row groups of `block_length` rows.
///
/// Nullable fields become OPTIONAL leaf columns, where absent and null values are stored as
/// nulls; the rest become REQUIRED columns and a row without a value there is rejected. A value
/// whose tag differs from its column's type is rejected with `InvalidInput` before it is
/// buffered.
pub struct ParquetRowWriter<W: Write + Send> {
    writer: SerializedFileWriter<W>,
    columns: Vec<Column>,
    buffer: Vec<Row>,
    block_length: usize,
}

impl<W: Write + Send> ParquetRowWriter<W> {
    pub fn new(out: W, schema: &Schema, options: &EncodeOptions) -> RecordFilterResult<Self> {
        let columns = schema.columns()?;
        let message = parse_message_type(&message_type(&columns))?;
        let props = WriterProperties::builder()
            .set_compression(options.codec.to_parquet_compression())
            .build();
        let writer = SerializedFileWriter::new(out, Arc::new(message), Arc::new(props))?;

        Ok(Self {
            writer,
            columns,
            buffer: Vec::with_capacity(options.block_length.max(1)),
            block_length: options.block_length.max(1),
        })
    }

    fn flush_row_group(&mut self) -> RecordFilterResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut rg = self.writer.next_row_group()?;
        let mut col_idx = 0usize;
        while let Some(mut col) = rg.next_column()? {
            let column = &self.columns[col_idx];
            let cells: Vec<Option<&Value>> = self
                .buffer
                .iter()
                .map(|row| row.get(&column.name).filter(|v| !v.is_null()))
                .collect();
            let def_levels: Vec<i16> = cells.iter().map(|c| i16::from(c.is_some())).collect();
            let levels = column.nullable.then_some(def_levels.as_slice());

            match col.untyped() {
                ColumnWriter::ByteArrayColumnWriter(w) => {
                    let values: Vec<ByteArray> = cells
                        .iter()
                        .filter_map(|c| match c {
                            Some(Value::String(s)) => Some(ByteArray::from(s.as_str())),
                            _ => None,
                        })
                        .collect();
                    w.write_batch(&values, levels, None)?;
                }
                ColumnWriter::Int32ColumnWriter(w) => {
                    let values: Vec<i32> = cells
                        .iter()
                        .filter_map(|c| match c {
                            Some(Value::Int32(v)) => Some(*v),
                            _ => None,
                        })
                        .collect();
                    w.write_batch(&values, levels, None)?;
                }
                ColumnWriter::Int64ColumnWriter(w) => {
                    let values: Vec<i64> = cells
                        .iter()
                        .filter_map(|c| match c {
                            Some(Value::Int64(v)) => Some(*v),
                            _ => None,
                        })
                        .collect();
                    w.write_batch(&values, levels, None)?;
                }
                ColumnWriter::FloatColumnWriter(w) => {
                    let values: Vec<f32> = cells
                        .iter()
                        .filter_map(|c| match c {
                            Some(Value::Float32(v)) => Some(*v),
                            _ => None,
                        })
                        .collect();
                    w.write_batch(&values, levels, None)?;
                }
                ColumnWriter::DoubleColumnWriter(w) => {
                    let values: Vec<f64> = cells
                        .iter()
                        .filter_map(|c| match c {
                            Some(Value::Float64(v)) => Some(*v),
                            _ => None,
                        })
                        .collect();
                    w.write_batch(&values, levels, None)?;
                }
                ColumnWriter::BoolColumnWriter(w) => {
                    let values: Vec<bool> = cells
                        .iter()
                        .filter_map(|c| match c {
                            Some(Value::Bool(v)) => Some(*v),
                            _ => None,
                        })
                        .collect();
                    w.write_batch(&values, levels, None)?;
                }
                _ => {
                    return Err(RecordFilterError::invalid_input(
                        column.name.as_str(),
                        "unexpected parquet column writer",
                    ));
                }
            }
            col.close()?;
            col_idx += 1;
        }
        rg.close()?;

        tracing::debug!(rows = self.buffer.len(), "wrote parquet row group");
        self.buffer.clear();
        Ok(())
    }
}

impl<W: Write + Send> RowSink for ParquetRowWriter<W> {
    fn write_row(&mut self, row: &Row) -> RecordFilterResult<()> {
        for column in &self.columns {
            match row.get(&column.name) {
                None | Some(Value::Null) if !column.nullable => {
                    return Err(RecordFilterError::invalid_input(
                        column.name.as_str(),
                        "null value for required column",
                    ));
                }
                None | Some(Value::Null) => {}
                Some(v) if v.primitive_type() == Some(column.data_type) => {}
                Some(v) => {
                    return Err(RecordFilterError::invalid_input(
                        column.name.as_str(),
                        format!("expected {} value, found {}", column.data_type, v.type_name()),
                    ));
                }
            }
        }

        self.buffer.push(row.clone());
        if self.buffer.len() >= self.block_length {
            self.flush_row_group()?;
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> RecordFilterResult<()> {
        self.flush_row_group()?;
        let mut out = self.writer.into_inner()?;
        out.flush()?;
        Ok(())
    }
}

fn physical_type(data_type: PrimitiveType) -> &'static str {
    match data_type {
        PrimitiveType::String => "BINARY",
        PrimitiveType::Int32 => "INT32",
        PrimitiveType::Int64 => "INT64",
        PrimitiveType::Float32 => "FLOAT",
        PrimitiveType::Float64 => "DOUBLE",
        PrimitiveType::Bool | PrimitiveType::Unspecified => "BOOLEAN",
    }
}

/// Render the Parquet message type for `columns`.
fn message_type(columns: &[Column]) -> String {
    let mut out = String::from("message schema {\n");
    for c in columns {
        let annotation = if c.data_type == PrimitiveType::String {
            " (UTF8)"
        } else {
            ""
        };
        let repetition = if c.nullable { "OPTIONAL" } else { "REQUIRED" };
        out.push_str(&format!(
            "  {repetition} {} {}{};\n",
            physical_type(c.data_type),
            c.name,
            annotation
        ));
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::message_type;
    use crate::schema::Column;
    use crate::types::PrimitiveType;

    #[test]
    fn renders_required_and_optional_columns() {
        let columns = vec![
            Column {
                name: "status".to_string(),
                data_type: PrimitiveType::String,
                nullable: false,
            },
            Column {
                name: "count".to_string(),
                data_type: PrimitiveType::Int32,
                nullable: true,
            },
        ];
        assert_eq!(
            message_type(&columns),
            "message schema {\n  REQUIRED BINARY status (UTF8);\n  OPTIONAL INT32 count;\n}"
        );
    }
}
