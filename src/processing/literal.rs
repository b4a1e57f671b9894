//! Literal parsing for each primitive domain.
//!
//! [`PrimitiveDomain`] ties a Rust type to its [`PrimitiveType`] tag, its literal parser, and the
//! [`Value`] variant that carries it. Filters are generic over this trait, so the per-row path only
//! matches one variant and never looks at the `PrimitiveType` again.

use std::fmt::Debug;

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::types::{PrimitiveType, Value};

/// A Rust type usable as the domain of a column comparison.
pub trait PrimitiveDomain: PartialEq + Clone + Debug + Send + Sync + 'static {
    /// Tag of this domain.
    const PRIMITIVE: PrimitiveType;

    /// Parse a configured literal. The error is a human-readable reason.
    fn parse_literal(raw: &str) -> Result<Self, String>;

    /// Borrow the payload if `value` carries this domain's variant.
    fn from_value(value: &Value) -> Option<&Self>;

    fn into_value(self) -> Value;
}

impl PrimitiveDomain for String {
    const PRIMITIVE: PrimitiveType = PrimitiveType::String;

    fn parse_literal(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl PrimitiveDomain for i32 {
    const PRIMITIVE: PrimitiveType = PrimitiveType::Int32;

    fn parse_literal(raw: &str) -> Result<Self, String> {
        raw.parse::<i32>().map_err(|e| e.to_string())
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Int32(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Int32(self)
    }
}

impl PrimitiveDomain for i64 {
    const PRIMITIVE: PrimitiveType = PrimitiveType::Int64;

    fn parse_literal(raw: &str) -> Result<Self, String> {
        raw.parse::<i64>().map_err(|e| e.to_string())
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Int64(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Int64(self)
    }
}

impl PrimitiveDomain for f32 {
    const PRIMITIVE: PrimitiveType = PrimitiveType::Float32;

    fn parse_literal(raw: &str) -> Result<Self, String> {
        let v = raw.parse::<f32>().map_err(|e| e.to_string())?;
        check_float_range(raw, v.is_infinite())?;
        Ok(v)
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Float32(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Float32(self)
    }
}

impl PrimitiveDomain for f64 {
    const PRIMITIVE: PrimitiveType = PrimitiveType::Float64;

    fn parse_literal(raw: &str) -> Result<Self, String> {
        let v = raw.parse::<f64>().map_err(|e| e.to_string())?;
        check_float_range(raw, v.is_infinite())?;
        Ok(v)
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Float64(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Float64(self)
    }
}

impl PrimitiveDomain for bool {
    const PRIMITIVE: PrimitiveType = PrimitiveType::Bool;

    fn parse_literal(raw: &str) -> Result<Self, String> {
        match raw {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err("expected boolean literal (true/false, t/f, 1/0)".to_string()),
        }
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

// A finite decimal literal that rounds to infinity is out of range; spelled-out infinities are not.
fn check_float_range(raw: &str, infinite: bool) -> Result<(), String> {
    if !infinite {
        return Ok(());
    }
    let unsigned = raw.trim_start_matches(['+', '-']).to_ascii_lowercase();
    if unsigned == "inf" || unsigned == "infinity" {
        Ok(())
    } else {
        Err("value out of range".to_string())
    }
}

/// Parse `raw` into the [`Value`] variant for `data_type`.
///
/// Used by text decoders (CSV cells) so cells and configured literals share one set of rules.
pub fn parse_value(column: &str, data_type: PrimitiveType, raw: &str) -> RecordFilterResult<Value> {
    fn typed<T: PrimitiveDomain>(column: &str, raw: &str) -> RecordFilterResult<Value> {
        T::parse_literal(raw)
            .map(T::into_value)
            .map_err(|message| {
                RecordFilterError::invalid_input(
                    column,
                    format!("cannot parse '{raw}' as {}: {message}", T::PRIMITIVE),
                )
            })
    }

    match data_type {
        PrimitiveType::String => typed::<String>(column, raw),
        PrimitiveType::Int32 => typed::<i32>(column, raw),
        PrimitiveType::Int64 => typed::<i64>(column, raw),
        PrimitiveType::Float32 => typed::<f32>(column, raw),
        PrimitiveType::Float64 => typed::<f64>(column, raw),
        PrimitiveType::Bool => typed::<bool>(column, raw),
        PrimitiveType::Unspecified => Err(RecordFilterError::InvalidType {
            name: data_type.name().to_string(),
        }),
    }
}
