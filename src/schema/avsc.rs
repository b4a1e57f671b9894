//! Serde model of Avro JSON schema documents (`.avsc`).
//!
//! Only what column-type resolution needs is modelled: type names, unions, and record fields.
//! Everything else in the document (docs, defaults, aliases, logical types) is ignored.

use serde::Deserialize;

use super::{AvroPrimitive, FieldShape};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SchemaNode {
    /// `"string"`, `"long"`, or a named-type reference such as `"com.acme.Address"`.
    Name(String),
    /// `["null", "string"]`
    Union(Vec<SchemaNode>),
    /// `{"type": ...}`
    Object(ObjectNode),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObjectNode {
    #[serde(rename = "type")]
    pub(crate) kind: Box<SchemaNode>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) fields: Option<Vec<FieldNode>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldNode {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) field_type: SchemaNode,
}

impl SchemaNode {
    pub(crate) fn shape(&self) -> FieldShape {
        match self {
            SchemaNode::Name(name) => match AvroPrimitive::from_name(name) {
                Some(p) => FieldShape::Primitive(p),
                None => FieldShape::Reference(name.clone()),
            },
            SchemaNode::Union(alternatives) => {
                FieldShape::Union(alternatives.iter().map(SchemaNode::shape).collect())
            }
            SchemaNode::Object(obj) => match obj.kind.as_ref() {
                SchemaNode::Name(kind) => match kind.as_str() {
                    "record" | "error" => FieldShape::Record,
                    "enum" => FieldShape::Enum,
                    "array" => FieldShape::Array,
                    "map" => FieldShape::Map,
                    "fixed" => FieldShape::Fixed,
                    // {"type": "int", "logicalType": "date"} is still an int.
                    other => match AvroPrimitive::from_name(other) {
                        Some(p) => FieldShape::Primitive(p),
                        None => FieldShape::Reference(other.to_string()),
                    },
                },
                nested => nested.shape(),
            },
        }
    }
}
