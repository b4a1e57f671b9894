//! NDJSON decoding.
//!
//! Input is a sequence of JSON objects separated by whitespace (typically one per line). Objects
//! are decoded lazily, one per `next()` call.
//!
//! JSON has a single number type, so numbers are tagged using the schema: a column declared
//! `int` decodes to [`Value::Int32`], `long` to [`Value::Int64`], `float` to [`Value::Float32`] and
//! `double` to [`Value::Float64`]. Strings and booleans keep their JSON type regardless of the
//! declaration, which lets filters detect drift (a `"5"` in an `int` column). Nested arrays and
//! objects decode to [`Value::Array`] and [`Value::Map`], with untyped numbers inside.

use std::collections::HashMap;
use std::io::Read;

use serde_json::de::IoRead;
use serde_json::StreamDeserializer;

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::schema::Schema;
use crate::types::{PrimitiveType, Row, Value};

/// Lazy NDJSON row decoder.
pub struct JsonRowReader<R: Read> {
    values: StreamDeserializer<'static, IoRead<R>, serde_json::Value>,
    column_types: HashMap<String, PrimitiveType>,
    record: usize,
    done: bool,
}

impl<R: Read> JsonRowReader<R> {
    /// Create a decoder over `reader`. Wrap unbuffered readers in a `BufReader`.
    pub fn new(reader: R, schema: &Schema) -> Self {
        let column_types = schema
            .fields
            .iter()
            .filter_map(|f| f.resolve().ok().map(|t| (f.name.clone(), t)))
            .collect();
        Self {
            values: serde_json::Deserializer::from_reader(reader).into_iter(),
            column_types,
            record: 0,
            done: false,
        }
    }

    fn decode(&self, value: serde_json::Value) -> RecordFilterResult<Row> {
        let obj = match value {
            serde_json::Value::Object(obj) => obj,
            other => {
                return Err(RecordFilterError::Decode {
                    message: format!(
                        "record {} is not a json object (found {})",
                        self.record,
                        json_kind(&other)
                    ),
                });
            }
        };

        let mut row = Row::new();
        for (name, v) in obj {
            let declared = self.column_types.get(&name).copied();
            let value = convert_json_value(&name, declared, v)?;
            row.insert(name, value);
        }
        Ok(row)
    }
}

impl<R: Read> Iterator for JsonRowReader<R> {
    type Item = RecordFilterResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.values.next()? {
            Ok(v) => {
                self.record += 1;
                self.decode(v)
            }
            Err(e) => Err(RecordFilterError::from(e)),
        };
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn convert_json_value(
    column: &str,
    declared: Option<PrimitiveType>,
    v: serde_json::Value,
) -> RecordFilterResult<Value> {
    match v {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::String(s) => Ok(Value::String(s)),
        serde_json::Value::Number(n) => convert_json_number(column, declared, &n),
        serde_json::Value::Array(items) => Ok(Value::Array(
            items
                .into_iter()
                .map(|item| convert_json_value(column, None, item))
                .collect::<RecordFilterResult<_>>()?,
        )),
        serde_json::Value::Object(entries) => Ok(Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| Ok::<_, RecordFilterError>((k, convert_json_value(column, None, v)?)))
                .collect::<RecordFilterResult<_>>()?,
        )),
    }
}

fn convert_json_number(
    column: &str,
    declared: Option<PrimitiveType>,
    n: &serde_json::Number,
) -> RecordFilterResult<Value> {
    let out_of_range = |t: PrimitiveType| {
        RecordFilterError::invalid_input(column, format!("number {n} out of range for {t}"))
    };

    match declared {
        Some(PrimitiveType::Int32) if n.is_i64() || n.is_u64() => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int32)
            .ok_or_else(|| out_of_range(PrimitiveType::Int32)),
        Some(PrimitiveType::Int64) if n.is_i64() || n.is_u64() => n
            .as_i64()
            .map(Value::Int64)
            .ok_or_else(|| out_of_range(PrimitiveType::Int64)),
        Some(PrimitiveType::Float32) => {
            let wide = n.as_f64().unwrap_or(f64::NAN);
            let narrow = wide as f32;
            if wide.is_finite() && !narrow.is_finite() {
                return Err(out_of_range(PrimitiveType::Float32));
            }
            Ok(Value::Float32(narrow))
        }
        Some(PrimitiveType::Float64) => Ok(Value::Float64(n.as_f64().unwrap_or(f64::NAN))),
        _ => match n.as_i64() {
            Some(v) => Ok(Value::Int64(v)),
            None => Ok(Value::Float64(n.as_f64().unwrap_or(f64::NAN))),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::JsonRowReader;
    use crate::error::RecordFilterError;
    use crate::schema::Schema;
    use crate::types::Value;

    fn schema() -> Schema {
        Schema::parse(
            r#"{"type":"record","name":"E","fields":[
                {"name":"status","type":"string"},
                {"name":"count","type":["int","null"]},
                {"name":"total","type":"long"},
                {"name":"ratio","type":"float"},
                {"name":"score","type":"double"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn numbers_follow_declared_types() {
        let input = r#"{"status":"a","count":3,"total":3,"ratio":0.5,"score":2,"extra":7,"x":1.5}"#;
        let rows: Vec<_> = JsonRowReader::new(input.as_bytes(), &schema())
            .collect::<Result<_, _>>()
            .unwrap();
        let row = &rows[0];
        assert_eq!(row.get("status"), Some(&Value::from("a")));
        assert_eq!(row.get("count"), Some(&Value::Int32(3)));
        assert_eq!(row.get("total"), Some(&Value::Int64(3)));
        assert_eq!(row.get("ratio"), Some(&Value::Float32(0.5)));
        assert_eq!(row.get("score"), Some(&Value::Float64(2.0)));
        assert_eq!(row.get("extra"), Some(&Value::Int64(7)));
        assert_eq!(row.get("x"), Some(&Value::Float64(1.5)));
    }

    #[test]
    fn keeps_json_strings_and_nulls_as_is() {
        let input = "{\"count\":\"5\"}\n{\"count\":null}\n{}\n";
        let rows: Vec<_> = JsonRowReader::new(input.as_bytes(), &schema())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("count"), Some(&Value::from("5")));
        assert_eq!(rows[1].get("count"), Some(&Value::Null));
        assert_eq!(rows[2].get("count"), None);
    }

    #[test]
    fn int_out_of_range_is_invalid_input() {
        let input = r#"{"count":4294967296}"#;
        let mut it = JsonRowReader::new(input.as_bytes(), &schema());
        assert!(matches!(
            it.next(),
            Some(Err(RecordFilterError::InvalidInput { ref column, .. })) if column == "count"
        ));
        assert!(it.next().is_none());
    }

    #[test]
    fn stops_after_first_error() {
        let input = "{\"status\":\"a\"}\n[1,2]\n{\"status\":\"b\"}\n";
        let out: Vec<_> = JsonRowReader::new(input.as_bytes(), &schema()).collect();
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        assert!(matches!(out[1], Err(RecordFilterError::Decode { .. })));
    }

    #[test]
    fn malformed_json_is_terminal() {
        let input = "{\"status\":\"a\"}\n{\"status\":\n";
        let out: Vec<_> = JsonRowReader::new(input.as_bytes(), &schema()).collect();
        assert_eq!(out.len(), 2);
        assert!(matches!(out[1], Err(RecordFilterError::Json(_))));
    }

    #[test]
    fn nested_values_decode_untyped() {
        let input = r#"{"status":{"code":1,"tags":["a",2.5]}}"#;
        let rows: Vec<_> = JsonRowReader::new(input.as_bytes(), &schema())
            .collect::<Result<_, _>>()
            .unwrap();
        let mut expected = BTreeMap::new();
        expected.insert("code".to_string(), Value::Int64(1));
        expected.insert(
            "tags".to_string(),
            Value::Array(vec![Value::from("a"), Value::Float64(2.5)]),
        );
        assert_eq!(rows[0].get("status"), Some(&Value::Map(expected)));
    }

    #[test]
    fn float_overflow_is_invalid_input() {
        let input = "{\"ratio\":1e39}\n{\"ratio\":3.5}\n";
        let mut it = JsonRowReader::new(input.as_bytes(), &schema());
        assert!(matches!(
            it.next(),
            Some(Err(RecordFilterError::InvalidInput { ref column, .. })) if column == "ratio"
        ));
        assert!(it.next().is_none());

        let input = r#"{"score":1e39}"#;
        let rows: Vec<_> = JsonRowReader::new(input.as_bytes(), &schema())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows[0].get("score"), Some(&Value::Float64(1e39)));
    }
}
