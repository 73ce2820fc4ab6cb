#![cfg(test)]

use ridl_compiler::{
    check_text, compile_text, CompiledIdl, ErrorCollection, ErrorId, GeneratorOptions, IdlError,
};

fn options() -> GeneratorOptions {
    GeneratorOptions {
        command_line: "ridlc generate --input test.idl".to_string(),
        header_name: "test_gen.h".to_string(),
    }
}

fn compile(text: &str) -> Result<CompiledIdl, IdlError> {
    compile_text("test.idl", text, &options())
}

/// Compile text expected to fail and return its error collection.
fn compile_errors(text: &str) -> ErrorCollection {
    match compile(text) {
        Err(IdlError::Compile(errors)) => errors,
        Ok(_) => panic!("compilation unexpectedly succeeded"),
        Err(other) => panic!("unexpected error kind: {}", other),
    }
}

macro_rules! string_type {
    () => {
        concat!(
            "type:\n",
            "    name: string\n",
            "    cpp_type: std::string\n",
            "    bson_serialization_type: string\n",
        )
    };
}

#[test]
fn test_full_pipeline() {
    let text = concat!(
        "global:\n",
        "    cpp_namespace: mongo\n",
        "    cpp_includes:\n",
        "        - mongo/db/namespace_string.h\n",
        "type:\n",
        "    name: string\n",
        "    description: A BSON UTF-8 string\n",
        "    cpp_type: std::string\n",
        "    bson_serialization_type: string\n",
        "type:\n",
        "    name: safeInt64\n",
        "    cpp_type: std::int64_t\n",
        "    bson_serialization_type: long\n",
        "struct:\n",
        "    name: Inner\n",
        "    fields:\n",
        "        value: string\n",
        "struct:\n",
        "    name: Outer\n",
        "    description: A reply document\n",
        "    strict: false\n",
        "    fields:\n",
        "        nested: Inner\n",
        "        counts: array<safeInt64>\n",
        "        note:\n",
        "            type: string\n",
        "            optional: true\n",
    );
    let compiled = compile(text).expect("compile failed");

    assert_eq!(compiled.spec.structs.len(), 2);
    assert_eq!(compiled.spec.structs[0].name, "Inner");
    assert_eq!(compiled.spec.structs[1].name, "Outer");
    assert_eq!(
        compiled.spec.globals.cpp_namespace.as_deref(),
        Some("mongo")
    );

    let header = &compiled.code.header;
    assert!(header.contains("#pragma once"));
    assert!(header.contains("#include \"mongo/db/namespace_string.h\""));
    assert!(header.contains("class Inner {"));
    assert!(header.contains("class Outer {"));
    assert!(header.contains("boost::optional<std::string> _note;"));
    assert!(header.contains("std::vector<std::int64_t> _counts;"));

    let source = &compiled.code.source;
    assert!(source.contains("Inner Inner::parse("));
    assert!(source.contains("void Outer::serialize("));
    assert!(source.contains("object._nested = Inner::parse(ctxt, localObject);"));
}

#[test]
fn test_generation_is_deterministic() {
    let text = concat!(
        "global:\n",
        "    cpp_namespace: mongo\n",
        "type:\n",
        "    name: string\n",
        "    cpp_type: std::string\n",
        "    bson_serialization_type: string\n",
        "struct:\n",
        "    name: One\n",
        "    fields:\n",
        "        a: string\n",
        "        b: array<string>\n",
    );
    let first = compile(text).expect("compile failed");
    let second = compile(text).expect("compile failed");
    assert_eq!(first.code, second.code);
}

#[test]
fn test_check_does_not_require_generation() {
    let text = concat!(
        "type:\n",
        "    name: string\n",
        "    cpp_type: std::string\n",
        "    bson_serialization_type: string\n",
        "struct:\n",
        "    name: One\n",
        "    fields:\n",
        "        value: string\n",
    );
    let bound = check_text("test.idl", text).expect("check failed");
    assert_eq!(bound.structs.len(), 1);
    // Without a global section there is no namespace to open.
    assert!(bound.globals.cpp_namespace.is_none());
}

// ---------------------------------------------------------------------------
// Document-level failures
// ---------------------------------------------------------------------------

#[test]
fn test_tab_indentation_is_a_parse_error() {
    match compile("struct:\n\tname: One\n") {
        Err(IdlError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected a parse error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_empty_document_compiles_to_empty_artifacts() {
    let compiled = compile("").expect("compile failed");
    assert!(compiled.spec.structs.is_empty());
    assert!(compiled.code.header.contains("#pragma once"));
    assert!(!compiled.code.header.contains("class "));
}

// ---------------------------------------------------------------------------
// Parser-level failures, one per error code
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_root_element() {
    let errors = compile_errors("bogus:\n    name: One\n");
    assert!(errors.contains(ErrorId::UnknownRootElement));
}

#[test]
fn test_duplicate_symbol_across_kinds() {
    let text = concat!(
        "type:\n",
        "    name: thing\n",
        "    cpp_type: std::string\n",
        "    bson_serialization_type: string\n",
        "struct:\n",
        "    name: thing\n",
        "    fields:\n",
        "        value: thing\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::DuplicateSymbol));
}

#[test]
fn test_unknown_struct_key() {
    let text = concat!(
        string_type!(),
        "struct:\n",
        "    name: One\n",
        "    bogus_key: true\n",
        "    fields:\n",
        "        value: string\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::UnknownNode));
}

#[test]
fn test_empty_field_list() {
    let text = concat!(string_type!(), "struct:\n", "    name: One\n", "    fields:\n");
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::EmptyFieldList));
}

#[test]
fn test_invalid_bool_literal() {
    let text = concat!(
        string_type!(),
        "struct:\n",
        "    name: One\n",
        "    strict: yes\n",
        "    fields:\n",
        "        value: string\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::InvalidBoolLiteral));
}

#[test]
fn test_duplicate_field_name() {
    let text = concat!(
        string_type!(),
        "struct:\n",
        "    name: One\n",
        "    fields:\n",
        "        value: string\n",
        "        value: string\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::DuplicateFieldName));
}

#[test]
fn test_errors_are_aggregated_across_sections() {
    // Two independent mistakes in one document must both be reported.
    let text = concat!(
        "bogus:\n",
        "    name: One\n",
        "type:\n",
        "    name: broken\n",
        "    cpp_type: std::string\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::UnknownRootElement));
    assert!(errors.contains(ErrorId::MissingRequiredKey));
    assert!(errors.len() >= 2);
}

// ---------------------------------------------------------------------------
// Binder-level failures
// ---------------------------------------------------------------------------

#[test]
fn test_unknown_field_type() {
    let text = concat!(
        string_type!(),
        "struct:\n",
        "    name: One\n",
        "    fields:\n",
        "        value: nonexistent\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::UnknownType));
}

#[test]
fn test_bad_bson_type() {
    let text = concat!(
        "type:\n",
        "    name: broken\n",
        "    cpp_type: std::int32_t\n",
        "    bson_serialization_type: float\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::BadBsonType));
}

#[test]
fn test_bindata_requires_valid_subtype() {
    let missing = concat!(
        "type:\n",
        "    name: blob\n",
        "    cpp_type: std::vector<std::uint8_t>\n",
        "    bson_serialization_type: bindata\n",
    );
    assert!(compile_errors(missing).contains(ErrorId::BadBindataSubtype));

    let invalid = concat!(
        "type:\n",
        "    name: blob\n",
        "    cpp_type: std::vector<std::uint8_t>\n",
        "    bson_serialization_type: bindata\n",
        "    bindata_subtype: bogus\n",
    );
    assert!(compile_errors(invalid).contains(ErrorId::BadBindataSubtype));
}

#[test]
fn test_bindata_in_type_list_is_rejected() {
    let text = concat!(
        "type:\n",
        "    name: broken\n",
        "    cpp_type: std::string\n",
        "    bson_serialization_type:\n",
        "        - bindata\n",
        "        - string\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::BadBsonType));
}

#[test]
fn test_non_scalar_in_type_list_is_rejected() {
    let text = concat!(
        "type:\n",
        "    name: broken\n",
        "    cpp_type: std::string\n",
        "    bson_serialization_type:\n",
        "        - object\n",
        "        - string\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::BadBsonTypeList));
}

#[test]
fn test_any_requires_deserializer() {
    let text = concat!(
        "type:\n",
        "    name: anyType\n",
        "    cpp_type: mongo::BSONElement\n",
        "    bson_serialization_type: any\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::MissingDeserializer));
}

#[test]
fn test_string_data_storage_is_banned() {
    let text = concat!(
        "type:\n",
        "    name: view\n",
        "    cpp_type: StringData\n",
        "    bson_serialization_type: string\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::NoStringDataType));
}

#[test]
fn test_non_canonical_int_is_rejected() {
    let text = concat!(
        "type:\n",
        "    name: narrow\n",
        "    cpp_type: std::int16_t\n",
        "    bson_serialization_type: int\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::NonCanonicalIntType));
}

#[test]
fn test_array_field_may_not_carry_default() {
    let text = concat!(
        string_type!(),
        "struct:\n",
        "    name: One\n",
        "    fields:\n",
        "        items:\n",
        "            type: array<string>\n",
        "            default: abc\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::ArrayNoDefault));
}

#[test]
fn test_struct_field_rejects_serialization_overrides() {
    let text = concat!(
        string_type!(),
        "struct:\n",
        "    name: Inner\n",
        "    fields:\n",
        "        value: string\n",
        "struct:\n",
        "    name: Outer\n",
        "    fields:\n",
        "        nested:\n",
        "            type: Inner\n",
        "            default: abc\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::StructTypeProperties));
}

#[test]
fn test_chained_type_requires_non_strict_struct() {
    let text = concat!(
        "type:\n",
        "    name: extras\n",
        "    cpp_type: mongo::BSONObj\n",
        "    bson_serialization_type: any\n",
        "    serializer: serializeToBSON\n",
        "    deserializer: parseFromBSON\n",
        "struct:\n",
        "    name: One\n",
        "    strict: true\n",
        "    chained_types:\n",
        "        - extras\n",
        "    fields:\n",
        "        value: extras\n",
    );
    let errors = compile_errors(text);
    assert!(errors.contains(ErrorId::ChainedTypeRequiresNonStrict));
}

#[test]
fn test_chained_type_expands_to_field() {
    let text = concat!(
        "type:\n",
        "    name: extras\n",
        "    cpp_type: mongo::BSONObj\n",
        "    bson_serialization_type: any\n",
        "    serializer: serializeToBSON\n",
        "    deserializer: parseFromBSON\n",
        "type:\n",
        "    name: string\n",
        "    cpp_type: std::string\n",
        "    bson_serialization_type: string\n",
        "struct:\n",
        "    name: One\n",
        "    strict: false\n",
        "    chained_types:\n",
        "        - extras\n",
        "    fields:\n",
        "        value: string\n",
    );
    let bound = check_text("test.idl", text).expect("check failed");
    let strct = &bound.structs[0];
    assert_eq!(strct.fields.len(), 2);
    let chained = strct.fields.iter().find(|f| f.chained).expect("no chained field");
    assert_eq!(chained.name, "extras");
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[test]
fn test_command_namespace_is_validated() {
    let good = concat!(
        string_type!(),
        "command:\n",
        "    name: ping\n",
        "    namespace: ignored\n",
        "    fields:\n",
        "        value: string\n",
    );
    let bound = check_text("test.idl", good).expect("check failed");
    assert!(bound.structs[0].namespace.is_some());

    let bad = concat!(
        string_type!(),
        "command:\n",
        "    name: ping\n",
        "    namespace: bogus\n",
        "    fields:\n",
        "        value: string\n",
    );
    let errors = compile_errors(bad);
    assert!(errors.contains(ErrorId::BadCommandNamespace));
}

// ---------------------------------------------------------------------------
// Generated text details
// ---------------------------------------------------------------------------

#[test]
fn test_strict_struct_rejects_unknown_wire_fields() {
    let text = concat!(
        string_type!(),
        "struct:\n",
        "    name: One\n",
        "    strict: true\n",
        "    fields:\n",
        "        value: string\n",
    );
    let compiled = compile(text).expect("compile failed");
    assert!(compiled.code.source.contains("ctxt.throwUnknownField(fieldName);"));
}

#[test]
fn test_required_and_defaulted_fields() {
    let text = concat!(
        string_type!(),
        "struct:\n",
        "    name: One\n",
        "    fields:\n",
        "        required_value: string\n",
        "        labeled:\n",
        "            type: string\n",
        "            default: fallback\n",
    );
    let compiled = compile(text).expect("compile failed");
    let source = &compiled.code.source;
    assert!(source.contains("ctxt.throwMissingField(kRequiredValueFieldName);"));
    assert!(source.contains("object._labeled = \"fallback\";"));
}

#[test]
fn test_array_element_sequence_is_validated() {
    let text = concat!(
        string_type!(),
        "struct:\n",
        "    name: One\n",
        "    fields:\n",
        "        items: array<string>\n",
    );
    let compiled = compile(text).expect("compile failed");
    let source = &compiled.code.source;
    assert!(source.contains("throwBadArrayFieldNumberSequence"));
    assert!(source.contains("throwBadArrayFieldNumberValue"));
}

#[test]
fn test_duplicate_wire_field_guard() {
    let text = concat!(
        string_type!(),
        "struct:\n",
        "    name: One\n",
        "    fields:\n",
        "        value: string\n",
    );
    let compiled = compile(text).expect("compile failed");
    assert!(compiled.code.source.contains("ctxt.throwDuplicateField(element);"));
}

#[test]
fn test_error_rendering_includes_location_and_code() {
    let errors = compile_errors("bogus:\n    name: One\n");
    let rendered = format!("{}", errors.entries()[0]);
    assert!(rendered.starts_with("test.idl: (1, 1): ID0001: "));
}
