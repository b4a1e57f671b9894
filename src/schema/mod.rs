//! Record schemas and column-type resolution.
//!
//! Schemas are Avro record schemas in their JSON form (`.avsc`). [`Schema::resolve_column`] maps
//! a column name to the [`PrimitiveType`] its filter is built for:
//!
//! - a primitive field resolves to its type (`null` and `bytes` are not comparable domains and
//!   fail with `InvalidType`)
//! - a union resolves to its first primitive alternative in declaration order, so a union that
//!   lists `null` first (`["null","string"]`) fails with `InvalidType` like a bare `null`
//! - records, enums, arrays, maps, fixed and named references fail with `InvalidField`
//!
//! ```rust
//! use record_filter::schema::Schema;
//! use record_filter::types::PrimitiveType;
//!
//! let schema = Schema::parse(r#"{
//!     "type": "record",
//!     "name": "Event",
//!     "fields": [
//!         {"name": "status", "type": "string"},
//!         {"name": "count", "type": ["int", "null"]}
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(schema.resolve_column("status").unwrap(), PrimitiveType::String);
//! assert_eq!(schema.resolve_column("count").unwrap(), PrimitiveType::Int32);
//! assert!(schema.resolve_column("missing").is_err());
//! ```

mod avsc;

use std::sync::OnceLock;

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::types::PrimitiveType;

use avsc::SchemaNode;

/// Avro primitive type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvroPrimitive {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl AvroPrimitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "bytes" => Self::Bytes,
            "string" => Self::String,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bytes => "bytes",
            Self::String => "string",
        }
    }

    /// The comparable domain for this primitive, if it has one.
    pub fn to_primitive_type(self) -> RecordFilterResult<PrimitiveType> {
        match self {
            Self::String => Ok(PrimitiveType::String),
            Self::Int => Ok(PrimitiveType::Int32),
            Self::Long => Ok(PrimitiveType::Int64),
            Self::Float => Ok(PrimitiveType::Float32),
            Self::Double => Ok(PrimitiveType::Float64),
            Self::Boolean => Ok(PrimitiveType::Bool),
            Self::Null | Self::Bytes => Err(RecordFilterError::InvalidType {
                name: self.name().to_string(),
            }),
        }
    }
}

/// Declared shape of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    Primitive(AvroPrimitive),
    Union(Vec<FieldShape>),
    Record,
    Enum,
    Array,
    Map,
    Fixed,
    /// A reference to a named type defined elsewhere.
    Reference(String),
}

impl FieldShape {
    fn describe(&self) -> String {
        match self {
            FieldShape::Primitive(p) => p.name().to_string(),
            FieldShape::Union(_) => "union".to_string(),
            FieldShape::Record => "record".to_string(),
            FieldShape::Enum => "enum".to_string(),
            FieldShape::Array => "array".to_string(),
            FieldShape::Map => "map".to_string(),
            FieldShape::Fixed => "fixed".to_string(),
            FieldShape::Reference(name) => format!("named type '{name}'"),
        }
    }

    fn admits_null(&self) -> bool {
        match self {
            FieldShape::Primitive(AvroPrimitive::Null) => true,
            FieldShape::Union(alternatives) => alternatives.iter().any(FieldShape::admits_null),
            _ => false,
        }
    }
}

/// A named field of a record [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub shape: FieldShape,
}

impl Field {
    pub fn new(name: impl Into<String>, shape: FieldShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    /// Resolve this field's comparable [`PrimitiveType`].
    pub fn resolve(&self) -> RecordFilterResult<PrimitiveType> {
        match &self.shape {
            FieldShape::Primitive(p) => p.to_primitive_type(),
            FieldShape::Union(alternatives) => alternatives
                .iter()
                .find_map(|alt| match alt {
                    FieldShape::Primitive(p) => Some(*p),
                    _ => None,
                })
                .ok_or_else(|| RecordFilterError::InvalidUnion {
                    column: self.name.clone(),
                })?
                .to_primitive_type(),
            other => Err(RecordFilterError::InvalidField {
                column: self.name.clone(),
                message: format!("{} is not a primitive or union type", other.describe()),
            }),
        }
    }
}

/// A flat column layout entry, used by codecs that need one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: PrimitiveType,
    pub nullable: bool,
}

/// An Avro record schema.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Record name (empty if the document omitted it).
    pub name: String,
    /// Ordered list of fields.
    pub fields: Vec<Field>,
    source: String,
    avro: OnceLock<apache_avro::Schema>,
}

impl Schema {
    /// Parse an Avro JSON schema. The top level must be a record with `fields`.
    pub fn parse(text: &str) -> RecordFilterResult<Self> {
        let node: SchemaNode = serde_json::from_str(text)
            .map_err(|e| RecordFilterError::invalid_schema(format!("unparsable schema: {e}")))?;

        let obj = match node {
            SchemaNode::Object(obj) => obj,
            other => {
                return Err(RecordFilterError::invalid_schema(format!(
                    "top-level schema must be a record, got {}",
                    other.shape().describe()
                )));
            }
        };
        match obj.kind.as_ref() {
            SchemaNode::Name(kind) if kind == "record" || kind == "error" => {}
            SchemaNode::Name(kind) => {
                return Err(RecordFilterError::invalid_schema(format!(
                    "top-level schema must be a record, got {kind}"
                )));
            }
            other => {
                return Err(RecordFilterError::invalid_schema(format!(
                    "top-level schema must be a record, got {}",
                    other.shape().describe()
                )));
            }
        }
        let fields = obj
            .fields
            .ok_or_else(|| RecordFilterError::invalid_schema("record schema has no fields"))?;

        Ok(Self {
            name: obj.name.unwrap_or_default(),
            fields: fields
                .into_iter()
                .map(|f| Field::new(f.name, f.field_type.shape()))
                .collect(),
            source: text.to_string(),
            avro: OnceLock::new(),
        })
    }

    /// The same document parsed as a full Avro schema, for the Avro container codecs.
    ///
    /// Parsed on first use, so text and tabular formats never depend on it.
    pub fn avro(&self) -> RecordFilterResult<&apache_avro::Schema> {
        if let Some(schema) = self.avro.get() {
            return Ok(schema);
        }
        let parsed = apache_avro::Schema::parse_str(&self.source)
            .map_err(|e| RecordFilterError::invalid_schema(format!("avro schema: {e}")))?;
        Ok(self.avro.get_or_init(|| parsed))
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolve the comparable type of `column`. Unknown columns fail with `InvalidSchema`.
    pub fn resolve_column(&self, column: &str) -> RecordFilterResult<PrimitiveType> {
        self.field(column)
            .ok_or_else(|| {
                RecordFilterError::invalid_schema(format!(
                    "column '{column}' not found in record '{}'",
                    self.name
                ))
            })?
            .resolve()
    }

    /// Resolve every field into a flat column layout. Fails on the first unresolvable field.
    pub fn columns(&self) -> RecordFilterResult<Vec<Column>> {
        self.fields
            .iter()
            .map(|f| {
                Ok(Column {
                    name: f.name.clone(),
                    data_type: f.resolve()?,
                    nullable: f.shape.admits_null(),
                })
            })
            .collect()
    }
}

/// Parse `schema` and resolve `column` in one step.
pub fn resolve_column_type(schema: &str, column: &str) -> RecordFilterResult<PrimitiveType> {
    Schema::parse(schema)?.resolve_column(column)
}
