//! Core data model types.
//!
//! A [`Row`] maps field names to dynamically typed [`Value`]s. The column being filtered on has a
//! statically known [`PrimitiveType`], resolved once from the schema; the filter is built for that
//! type and compares against the row's value tag.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, Serializer};

use crate::error::{RecordFilterError, RecordFilterResult};

/// Closed set of primitive domains a column can be compared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    /// Placeholder for "not resolved". Never dispatchable.
    #[default]
    Unspecified,
    /// UTF-8 string (`string`).
    String,
    /// 32-bit signed integer (`int`).
    Int32,
    /// 64-bit signed integer (`long`).
    Int64,
    /// 32-bit float (`float`).
    Float32,
    /// 64-bit float (`double`).
    Float64,
    /// Boolean (`boolean`).
    Bool,
}

impl PrimitiveType {
    /// The six dispatchable types, in declaration order.
    pub const ALL: [PrimitiveType; 6] = [
        PrimitiveType::String,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::Bool,
    ];

    /// Canonical name of the type.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Unspecified => "UNSPECIFIED",
            PrimitiveType::String => "string",
            PrimitiveType::Int32 => "int",
            PrimitiveType::Int64 => "long",
            PrimitiveType::Float32 => "float",
            PrimitiveType::Float64 => "double",
            PrimitiveType::Bool => "boolean",
        }
    }

    /// Parse a canonical type name.
    ///
    /// Only the six dispatchable names are accepted; `UNSPECIFIED` is rejected like any unknown
    /// name.
    pub fn from_name(name: &str) -> RecordFilterResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| RecordFilterError::InvalidType {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveType {
    type Err = RecordFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// A single dynamically typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null.
    Null,
    /// UTF-8 string.
    String(String),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// Raw bytes (Avro `bytes` and `fixed`).
    Bytes(Vec<u8>),
    /// Ordered list (Avro `array`).
    Array(Vec<Value>),
    /// String-keyed entries (Avro `map` and nested `record`).
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// The primitive type carried by this value, `None` for [`Value::Null`] and the
    /// non-comparable variants.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Value::Null | Value::Bytes(_) | Value::Array(_) | Value::Map(_) => None,
            Value::String(_) => Some(PrimitiveType::String),
            Value::Int32(_) => Some(PrimitiveType::Int32),
            Value::Int64(_) => Some(PrimitiveType::Int64),
            Value::Float32(_) => Some(PrimitiveType::Float32),
            Value::Float64(_) => Some(PrimitiveType::Float64),
            Value::Bool(_) => Some(PrimitiveType::Bool),
        }
    }

    /// Short tag name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            other => other.primitive_type().map_or("null", PrimitiveType::name),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// JSON rendering: non-finite floats become `null`, bytes become a string of code points
/// 0-255 (the Avro JSON encoding).
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Float32(v) if v.is_finite() => serializer.serialize_f32(*v),
            Value::Float64(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Float32(_) | Value::Float64(_) => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Bytes(b) => {
                let text: String = b.iter().map(|&c| char::from(c)).collect();
                serializer.serialize_str(&text)
            }
            Value::Array(items) => serializer.collect_seq(items),
            Value::Map(entries) => serializer.collect_map(entries),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

/// One decoded record: field name to value.
///
/// A field can be absent (no entry) or present as [`Value::Null`]; filters treat both as a
/// non-match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Name of the record field a filter targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetColumnName(String);

impl TargetColumnName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetColumnName {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

impl From<String> for TargetColumnName {
    fn from(v: String) -> Self {
        Self(v)
    }
}

/// The match criterion before type resolution: column plus the literal as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTargetConfig {
    pub column: TargetColumnName,
    pub value: String,
}

impl RawTargetConfig {
    pub fn new(column: impl Into<TargetColumnName>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// The match criterion after type resolution: column plus a literal parsed into `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig<T> {
    pub column: TargetColumnName,
    pub value: T,
}
