use std::fmt;

use thiserror::Error;

use crate::document::SourceLocation;
use crate::utils::quote;

/// Closed catalog of compile error codes.
///
/// The code strings are a semi-public contract: external tooling asserts on
/// codes, never on message text. Codes are stable once published; retired
/// codes are not reused. Uniqueness over [`ErrorId::ALL`] is checked by a
/// unit test below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorId {
    UnknownRootElement,
    DuplicateSymbol,
    IllegalNodeType,
    DuplicateNode,
    UnknownNode,
    MissingRequiredKey,
    EmptyFieldList,
    InvalidBoolLiteral,
    UnknownType,
    ArrayTypeName,
    ArrayFieldName,
    BadArrayTypeName,
    BadBsonType,
    BadBsonTypeList,
    BadBindataSubtype,
    UnexpectedBindataSubtype,
    BindataNoDefault,
    MissingDeserializer,
    MissingSerializer,
    CustomScalarSerialization,
    NoStringDataType,
    BannedCppType,
    NonCanonicalIntType,
    ArrayNoDefault,
    FieldMustBeEmptyForIgnored,
    DuplicateFieldName,
    ChainedTypeNotFound,
    ChainedTypeRequiresNonStrict,
    StructTypeProperties,
    BadCommandNamespace,
}

impl ErrorId {
    pub const ALL: [ErrorId; 30] = [
        ErrorId::UnknownRootElement,
        ErrorId::DuplicateSymbol,
        ErrorId::IllegalNodeType,
        ErrorId::DuplicateNode,
        ErrorId::UnknownNode,
        ErrorId::MissingRequiredKey,
        ErrorId::EmptyFieldList,
        ErrorId::InvalidBoolLiteral,
        ErrorId::UnknownType,
        ErrorId::ArrayTypeName,
        ErrorId::ArrayFieldName,
        ErrorId::BadArrayTypeName,
        ErrorId::BadBsonType,
        ErrorId::BadBsonTypeList,
        ErrorId::BadBindataSubtype,
        ErrorId::UnexpectedBindataSubtype,
        ErrorId::BindataNoDefault,
        ErrorId::MissingDeserializer,
        ErrorId::MissingSerializer,
        ErrorId::CustomScalarSerialization,
        ErrorId::NoStringDataType,
        ErrorId::BannedCppType,
        ErrorId::NonCanonicalIntType,
        ErrorId::ArrayNoDefault,
        ErrorId::FieldMustBeEmptyForIgnored,
        ErrorId::DuplicateFieldName,
        ErrorId::ChainedTypeNotFound,
        ErrorId::ChainedTypeRequiresNonStrict,
        ErrorId::StructTypeProperties,
        ErrorId::BadCommandNamespace,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ErrorId::UnknownRootElement => "ID0001",
            ErrorId::DuplicateSymbol => "ID0002",
            ErrorId::IllegalNodeType => "ID0003",
            ErrorId::DuplicateNode => "ID0004",
            ErrorId::UnknownNode => "ID0005",
            ErrorId::MissingRequiredKey => "ID0006",
            ErrorId::EmptyFieldList => "ID0007",
            ErrorId::InvalidBoolLiteral => "ID0008",
            ErrorId::UnknownType => "ID0009",
            ErrorId::ArrayTypeName => "ID0010",
            ErrorId::ArrayFieldName => "ID0011",
            ErrorId::BadArrayTypeName => "ID0012",
            ErrorId::BadBsonType => "ID0013",
            ErrorId::BadBsonTypeList => "ID0014",
            ErrorId::BadBindataSubtype => "ID0015",
            ErrorId::UnexpectedBindataSubtype => "ID0016",
            ErrorId::BindataNoDefault => "ID0017",
            ErrorId::MissingDeserializer => "ID0018",
            ErrorId::MissingSerializer => "ID0019",
            ErrorId::CustomScalarSerialization => "ID0020",
            ErrorId::NoStringDataType => "ID0021",
            ErrorId::BannedCppType => "ID0022",
            ErrorId::NonCanonicalIntType => "ID0023",
            ErrorId::ArrayNoDefault => "ID0024",
            ErrorId::FieldMustBeEmptyForIgnored => "ID0025",
            ErrorId::DuplicateFieldName => "ID0026",
            ErrorId::ChainedTypeNotFound => "ID0027",
            ErrorId::ChainedTypeRequiresNonStrict => "ID0028",
            ErrorId::StructTypeProperties => "ID0029",
            ErrorId::BadCommandNamespace => "ID0030",
        }
    }
}

/// One reported compile error: a stable code, a rendered message, and the
/// source location it was reported against.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEntry {
    pub id: ErrorId,
    pub msg: String,
    pub location: SourceLocation,
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: ({}, {}): {}: {}",
            self.location.file, self.location.line, self.location.column,
            self.id.code(),
            self.msg
        )
    }
}

/// Ordered collection of compile errors for one pipeline stage.
///
/// Each stage keeps reporting into the collection until its full pass is
/// done; a non-empty collection then stops the pipeline before the next
/// stage. Entries keep insertion order so diagnostics come out in document
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorCollection {
    entries: Vec<ErrorEntry>,
}

impl ErrorCollection {
    pub fn new() -> Self {
        ErrorCollection::default()
    }

    pub fn add(&mut self, location: &SourceLocation, id: ErrorId, msg: impl Into<String>) {
        self.entries.push(ErrorEntry {
            id,
            msg: msg.into(),
            location: location.clone(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn contains(&self, id: ErrorId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Fold another stage's collection into this one.
    pub fn extend(&mut self, other: ErrorCollection) {
        self.entries.extend(other.entries);
    }

    // Reporting helpers, one per rule, so the parser and binder read as a
    // list of rule checks rather than format! calls.

    pub fn add_unknown_root(&mut self, loc: &SourceLocation, name: &str) {
        self.add(
            loc,
            ErrorId::UnknownRootElement,
            format!("unknown IDL root element {}", quote(name)),
        );
    }

    pub fn add_duplicate_symbol(&mut self, loc: &SourceLocation, name: &str, kind: &str) {
        self.add(
            loc,
            ErrorId::DuplicateSymbol,
            format!("{} {} is a duplicate symbol", kind, quote(name)),
        );
    }

    pub fn add_illegal_node(&mut self, loc: &SourceLocation, key: &str, expected: &str, actual: &str) {
        self.add(
            loc,
            ErrorId::IllegalNodeType,
            format!(
                "illegal node type {} for {}, expected {}",
                quote(actual),
                quote(key),
                expected
            ),
        );
    }

    pub fn add_duplicate_node(&mut self, loc: &SourceLocation, key: &str) {
        self.add(
            loc,
            ErrorId::DuplicateNode,
            format!("duplicate node {}", quote(key)),
        );
    }

    pub fn add_unknown_node(&mut self, loc: &SourceLocation, section: &str, key: &str) {
        self.add(
            loc,
            ErrorId::UnknownNode,
            format!("unknown node {} in {}", quote(key), quote(section)),
        );
    }

    pub fn add_missing_required_key(&mut self, loc: &SourceLocation, section: &str, key: &str) {
        self.add(
            loc,
            ErrorId::MissingRequiredKey,
            format!("{} is missing required node {}", quote(section), quote(key)),
        );
    }

    pub fn add_empty_field_list(&mut self, loc: &SourceLocation, name: &str) {
        self.add(
            loc,
            ErrorId::EmptyFieldList,
            format!("struct {} must declare at least one field", quote(name)),
        );
    }

    pub fn add_invalid_bool(&mut self, loc: &SourceLocation, key: &str, value: &str) {
        self.add(
            loc,
            ErrorId::InvalidBoolLiteral,
            format!(
                "{} expects the literal \"true\" or \"false\", found {}",
                quote(key),
                quote(value)
            ),
        );
    }

    pub fn add_unknown_type(&mut self, loc: &SourceLocation, field: &str, type_name: &str) {
        self.add(
            loc,
            ErrorId::UnknownType,
            format!(
                "type {} of field {} is not declared",
                quote(type_name),
                quote(field)
            ),
        );
    }

    pub fn add_array_type_name(&mut self, loc: &SourceLocation, name: &str) {
        self.add(
            loc,
            ErrorId::ArrayTypeName,
            format!("type name {} may not start with \"array<\"", quote(name)),
        );
    }

    pub fn add_array_field_name(&mut self, loc: &SourceLocation, name: &str) {
        self.add(
            loc,
            ErrorId::ArrayFieldName,
            format!("field name {} is reserved array syntax", quote(name)),
        );
    }

    pub fn add_bad_array_type_name(&mut self, loc: &SourceLocation, field: &str, type_name: &str) {
        self.add(
            loc,
            ErrorId::BadArrayTypeName,
            format!(
                "field {} has malformed array type {}; only one level of \"array<...>\" is supported",
                quote(field),
                quote(type_name)
            ),
        );
    }

    pub fn add_bad_bson_type(&mut self, loc: &SourceLocation, owner: &str, bson_type: &str) {
        self.add(
            loc,
            ErrorId::BadBsonType,
            format!("{} has invalid bson type {}", quote(owner), quote(bson_type)),
        );
    }

    pub fn add_bad_bson_type_list(&mut self, loc: &SourceLocation, owner: &str, bson_type: &str) {
        self.add(
            loc,
            ErrorId::BadBsonTypeList,
            format!(
                "{} lists bson type {}; multi-type lists accept scalar types only",
                quote(owner),
                quote(bson_type)
            ),
        );
    }

    pub fn add_bad_bindata_subtype(&mut self, loc: &SourceLocation, owner: &str, subtype: &str) {
        self.add(
            loc,
            ErrorId::BadBindataSubtype,
            format!("{} has invalid bindata subtype {}", quote(owner), quote(subtype)),
        );
    }

    pub fn add_missing_bindata_subtype(&mut self, loc: &SourceLocation, owner: &str) {
        self.add(
            loc,
            ErrorId::BadBindataSubtype,
            format!("{} is a bindata type and requires a bindata_subtype", quote(owner)),
        );
    }

    pub fn add_unexpected_bindata_subtype(&mut self, loc: &SourceLocation, owner: &str) {
        self.add(
            loc,
            ErrorId::UnexpectedBindataSubtype,
            format!("{} declares a bindata_subtype but is not a bindata type", quote(owner)),
        );
    }

    pub fn add_bindata_no_default(&mut self, loc: &SourceLocation, owner: &str) {
        self.add(
            loc,
            ErrorId::BindataNoDefault,
            format!("bindata type {} may not declare a default value", quote(owner)),
        );
    }

    pub fn add_missing_deserializer(&mut self, loc: &SourceLocation, owner: &str, bson_type: &str) {
        self.add(
            loc,
            ErrorId::MissingDeserializer,
            format!(
                "{} with bson type {} requires a custom deserializer",
                quote(owner),
                quote(bson_type)
            ),
        );
    }

    pub fn add_missing_serializer(&mut self, loc: &SourceLocation, owner: &str, bson_type: &str) {
        self.add(
            loc,
            ErrorId::MissingSerializer,
            format!(
                "{} with bson type {} requires a custom serializer",
                quote(owner),
                quote(bson_type)
            ),
        );
    }

    pub fn add_custom_scalar_serialization(&mut self, loc: &SourceLocation, owner: &str, routine: &str) {
        self.add(
            loc,
            ErrorId::CustomScalarSerialization,
            format!(
                "custom serialization {} on scalar type {} is not supported; the routine must operate on BSONElement",
                quote(routine),
                quote(owner)
            ),
        );
    }

    pub fn add_no_string_data(&mut self, loc: &SourceLocation, owner: &str) {
        self.add(
            loc,
            ErrorId::NoStringDataType,
            format!("{} may not use cpp_type StringData, use std::string instead", quote(owner)),
        );
    }

    pub fn add_banned_cpp_type(&mut self, loc: &SourceLocation, owner: &str, cpp_type: &str) {
        self.add(
            loc,
            ErrorId::BannedCppType,
            format!(
                "{} uses banned cpp_type {}; use a fixed-width std:: integer alias",
                quote(owner),
                quote(cpp_type)
            ),
        );
    }

    pub fn add_non_canonical_int(&mut self, loc: &SourceLocation, owner: &str, cpp_type: &str) {
        self.add(
            loc,
            ErrorId::NonCanonicalIntType,
            format!(
                "{} uses non-canonical integer cpp_type {}; only std::int32_t, std::int64_t, std::uint32_t and std::uint64_t are accepted",
                quote(owner),
                quote(cpp_type)
            ),
        );
    }

    pub fn add_array_no_default(&mut self, loc: &SourceLocation, field: &str) {
        self.add(
            loc,
            ErrorId::ArrayNoDefault,
            format!("array field {} may not have a default value", quote(field)),
        );
    }

    pub fn add_ignored_field_not_empty(&mut self, loc: &SourceLocation, field: &str, property: &str) {
        self.add(
            loc,
            ErrorId::FieldMustBeEmptyForIgnored,
            format!(
                "ignored field {} must not set {}",
                quote(field),
                quote(property)
            ),
        );
    }

    pub fn add_duplicate_field_name(&mut self, loc: &SourceLocation, owner: &str, field: &str) {
        self.add(
            loc,
            ErrorId::DuplicateFieldName,
            format!("struct {} declares field {} twice", quote(owner), quote(field)),
        );
    }

    pub fn add_chained_type_not_found(&mut self, loc: &SourceLocation, owner: &str, type_name: &str) {
        self.add(
            loc,
            ErrorId::ChainedTypeNotFound,
            format!(
                "chained type {} of struct {} is not a declared type",
                quote(type_name),
                quote(owner)
            ),
        );
    }

    pub fn add_chained_requires_non_strict(&mut self, loc: &SourceLocation, owner: &str) {
        self.add(
            loc,
            ErrorId::ChainedTypeRequiresNonStrict,
            format!("struct {} with chained_types must set strict: false", quote(owner)),
        );
    }

    pub fn add_struct_type_properties(&mut self, loc: &SourceLocation, field: &str, property: &str) {
        self.add(
            loc,
            ErrorId::StructTypeProperties,
            format!(
                "field {} resolves to a struct and may not override {}",
                quote(field),
                quote(property)
            ),
        );
    }

    pub fn add_bad_command_namespace(&mut self, loc: &SourceLocation, command: &str, namespace: &str) {
        self.add(
            loc,
            ErrorId::BadCommandNamespace,
            format!(
                "command {} has invalid namespace {}; expected \"ignored\" or \"concatenate_with_db\"",
                quote(command),
                quote(namespace)
            ),
        );
    }
}

impl fmt::Display for ErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum IdlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    Parse {
        msg: String,
        line: usize,
        column: usize,
    },

    #[error("Compilation failed:\n{0}")]
    Compile(ErrorCollection),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_error_codes_unique() {
        let mut seen = HashSet::new();
        for id in ErrorId::ALL {
            assert!(seen.insert(id.code()), "duplicate error code {}", id.code());
        }
        assert_eq!(seen.len(), ErrorId::ALL.len());
    }

    #[test]
    fn test_dump_format() {
        let mut errors = ErrorCollection::new();
        let loc = SourceLocation::new("sample.idl", 4, 9);
        errors.add_unknown_root(&loc, "bogus");
        let dump = errors.to_string();
        assert_eq!(
            dump,
            "sample.idl: (4, 9): ID0001: unknown IDL root element \"bogus\"\n"
        );
    }
}
