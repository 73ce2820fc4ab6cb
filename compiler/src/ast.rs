//! Bound AST: the fully resolved, validated tree produced by the binder and
//! consumed by the code generator.

use serde::Serialize;

use crate::document::SourceLocation;
use crate::syntax::CommandNamespace;

#[derive(Debug, Clone, Default, Serialize)]
pub struct BoundGlobal {
    pub cpp_namespace: Option<String>,
    pub cpp_includes: Vec<String>,
}

/// What a bound field serializes as. A non-ignored field is either a
/// reference to another bound struct or a typed scalar value, never both;
/// ignored fields carry no serialization semantics at all.
#[derive(Debug, Clone, Serialize)]
pub enum BoundFieldType {
    /// Nested struct; the wire type is always `object`.
    Struct { name: String },
    /// A value with merged field/type serialization attributes.
    Scalar {
        cpp_type: String,
        bson_serialization_type: Vec<String>,
        bindata_subtype: Option<String>,
        serializer: Option<String>,
        deserializer: Option<String>,
    },
    /// Recognized during deserialization and skipped everywhere else.
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundField {
    pub loc: SourceLocation,
    pub name: String,
    pub description: Option<String>,
    pub optional: bool,
    pub array: bool,
    /// Synthesized from a chained_types entry rather than declared.
    pub chained: bool,
    pub ignore: bool,
    pub default: Option<String>,
    pub field_type: BoundFieldType,
}

impl BoundField {
    pub fn struct_type(&self) -> Option<&str> {
        match &self.field_type {
            BoundFieldType::Struct { name } => Some(name),
            _ => None,
        }
    }

    /// The bson type names this field accepts on the wire.
    pub fn bson_types(&self) -> Vec<&str> {
        match &self.field_type {
            BoundFieldType::Struct { .. } => vec!["object"],
            BoundFieldType::Scalar {
                bson_serialization_type,
                ..
            } => bson_serialization_type.iter().map(|s| s.as_str()).collect(),
            BoundFieldType::Ignored => Vec::new(),
        }
    }

    /// True for fields typed as the single bson type "any": their wire type
    /// is unchecked by the generated deserializer.
    pub fn is_any_type(&self) -> bool {
        matches!(
            &self.field_type,
            BoundFieldType::Scalar { bson_serialization_type, .. }
                if bson_serialization_type.len() == 1 && bson_serialization_type[0] == "any"
        )
    }

    pub fn serializer(&self) -> Option<&str> {
        match &self.field_type {
            BoundFieldType::Scalar { serializer, .. } => serializer.as_deref(),
            _ => None,
        }
    }

    pub fn deserializer(&self) -> Option<&str> {
        match &self.field_type {
            BoundFieldType::Scalar { deserializer, .. } => deserializer.as_deref(),
            _ => None,
        }
    }

    pub fn bindata_subtype(&self) -> Option<&str> {
        match &self.field_type {
            BoundFieldType::Scalar {
                bindata_subtype, ..
            } => bindata_subtype.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundStruct {
    pub name: String,
    pub description: Option<String>,
    pub strict: bool,
    /// Set when the struct was declared as a command.
    pub namespace: Option<CommandNamespace>,
    /// Declaration order; codegen emission is driven by this order.
    pub fields: Vec<BoundField>,
}

/// Successful binder output. Error outcomes are carried separately in an
/// `ErrorCollection`; the two never coexist.
#[derive(Debug, Clone, Serialize)]
pub struct BoundSpec {
    pub globals: BoundGlobal,
    pub structs: Vec<BoundStruct>,
}
