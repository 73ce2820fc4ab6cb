//! Code generator: bound AST -> (header text, source text).
//!
//! Both artifacts are deterministic renderings of the bound spec. Emission
//! order is the struct's field declaration order; the generated
//! deserializer scans the wire document in wire order. The two orderings
//! are independent and must not be conflated.

use crate::ast::{BoundField, BoundFieldType, BoundSpec, BoundStruct};
use crate::bson;
use crate::cpp_types::{camel_case, title_case, CppTypeInfo};
use crate::struct_types::StructTypeInfo;
use crate::utils::quote;
use crate::writer::CodeWriter;

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Recorded verbatim in the generated-file banner.
    pub command_line: String,
    /// Header file name the source artifact includes.
    pub header_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCode {
    pub header: String,
    pub source: String,
}

pub fn generate(spec: &BoundSpec, options: &GeneratorOptions) -> GeneratedCode {
    GeneratedCode {
        header: generate_header(spec, options),
        source: generate_source(spec, options),
    }
}

fn banner(writer: &mut CodeWriter, options: &GeneratorOptions) {
    writer.line("/**");
    writer.line(" * WARNING: This is a generated file. Do not modify.");
    writer.line(" *");
    writer.line(format!(" * Source: {}", options.command_line));
    writer.line(" */");
    writer.empty_line();
}

/// `k<Field>FieldName` constant used by both artifacts.
fn field_constant(field: &BoundField) -> String {
    format!("k{}FieldName", title_case(&field.name))
}

fn member_name(field: &BoundField) -> String {
    format!("_{}", camel_case(&field.name))
}

fn getter_name(field: &BoundField) -> String {
    format!("get{}", title_case(&field.name))
}

fn setter_name(field: &BoundField) -> String {
    format!("set{}", title_case(&field.name))
}

/// Spell a custom (de)serialization routine invocation: names containing
/// `::` are free functions, anything else is a method on the value.
fn routine_call(routine: &str, expr: &str) -> String {
    if routine.contains("::") {
        format!("{}({})", routine, expr)
    } else {
        format!("{}.{}()", expr, routine)
    }
}

fn routine_call_with_args(routine: &str, expr: &str, args: &str) -> String {
    if routine.contains("::") {
        format!("{}({}, {})", routine, expr, args)
    } else {
        format!("{}.{}({})", expr, routine, args)
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

fn generate_header(spec: &BoundSpec, options: &GeneratorOptions) -> String {
    let mut writer = CodeWriter::new();
    banner(&mut writer, options);

    writer.line("#pragma once");
    writer.empty_line();
    writer.line("#include <algorithm>");
    writer.line("#include <boost/optional.hpp>");
    writer.line("#include <cstdint>");
    writer.line("#include <string>");
    writer.line("#include <vector>");
    writer.empty_line();
    writer.line("#include \"mongo/base/string_data.h\"");
    writer.line("#include \"mongo/bson/bsonobj.h\"");
    writer.line("#include \"mongo/bson/bsonobjbuilder.h\"");
    writer.line("#include \"mongo/idl/idl_parser.h\"");
    for include in &spec.globals.cpp_includes {
        writer.line(format!("#include \"{}\"", include));
    }
    writer.empty_line();

    if let Some(namespace) = &spec.globals.cpp_namespace {
        writer.line(format!("namespace {} {{", namespace));
        writer.empty_line();
    }

    for strct in &spec.structs {
        emit_class(&mut writer, strct);
        writer.empty_line();
    }

    if let Some(namespace) = &spec.globals.cpp_namespace {
        writer.line(format!("}}  // namespace {}", namespace));
    }

    writer.finish()
}

fn emit_class(writer: &mut CodeWriter, strct: &BoundStruct) {
    let info = StructTypeInfo::new(strct);

    if let Some(description) = &strct.description {
        writer.line("/**");
        writer.line(format!(" * {}", description));
        writer.line(" */");
    }
    writer.block(&format!("class {} {{", info.class_name()), "};", |writer| {
        writer.line("public:");
        // Every field gets a name constant: the deserializer dispatches on
        // ignored fields too, it just skips their values.
        for field in &strct.fields {
            writer.line(format!(
                "    static constexpr auto {} = {}_sd;",
                field_constant(field),
                quote(&field.name)
            ));
        }
        writer.empty_line();
        writer.line(format!("    {}", info.parse_method().declaration()));
        writer.line(format!("    {}", info.serialize_method().declaration()));
        writer.empty_line();

        for field in visible_fields(strct) {
            emit_accessors(writer, field);
        }

        writer.line("private:");
        for field in visible_fields(strct) {
            let mapping = CppTypeInfo::for_field(field);
            writer.line(format!(
                "    {} {};",
                mapping.storage_type(),
                member_name(field)
            ));
        }
    });
}

/// Fields with generated storage and accessors: everything except ignored.
fn visible_fields(strct: &BoundStruct) -> impl Iterator<Item = &BoundField> {
    strct.fields.iter().filter(|f| !f.ignore)
}

fn emit_accessors(writer: &mut CodeWriter, field: &BoundField) {
    let mapping = CppTypeInfo::for_field(field);
    let member = member_name(field);
    let getter = getter_name(field);
    let view_type = mapping.view_type();

    if let Some(description) = &field.description {
        writer.line(format!("    // {}", description));
    }

    let (return_type, qualifier) = if mapping.return_by_reference() {
        (format!("const {}&", view_type), " const")
    } else if mapping.disable_rvalue() {
        (view_type.clone(), " const&")
    } else {
        (view_type.clone(), " const")
    };

    let body = mapping.getter_body(&member);
    if body.len() == 1 {
        writer.line(format!(
            "    {} {}(){} {{ {} }}",
            return_type, getter, qualifier, body[0]
        ));
    } else {
        writer.block(
            &format!("    {} {}(){} {{", return_type, getter, qualifier),
            "    }",
            |writer| {
                for line in &body {
                    writer.line(format!("    {}", line));
                }
            },
        );
    }
    if mapping.disable_rvalue() {
        writer.line(format!("    void {}() && = delete;", getter));
    }

    let setter_body = mapping.setter_body(&member, "value");
    if setter_body.len() == 1 {
        writer.line(format!(
            "    void {}({} value) {{ {} }}",
            setter_name(field),
            view_type,
            setter_body[0]
        ));
    } else {
        writer.block(
            &format!("    void {}({} value) {{", setter_name(field), view_type),
            "    }",
            |writer| {
                for line in &setter_body {
                    writer.line(format!("    {}", line));
                }
            },
        );
    }
    writer.empty_line();
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

fn generate_source(spec: &BoundSpec, options: &GeneratorOptions) -> String {
    let mut writer = CodeWriter::new();
    banner(&mut writer, options);

    writer.line(format!("#include \"{}\"", options.header_name));
    writer.empty_line();
    writer.line("#include <set>");
    writer.empty_line();
    writer.line("#include \"mongo/base/parse_number.h\"");
    writer.empty_line();

    if let Some(namespace) = &spec.globals.cpp_namespace {
        writer.line(format!("namespace {} {{", namespace));
        writer.empty_line();
    }

    for strct in &spec.structs {
        emit_deserializer(&mut writer, strct);
        writer.empty_line();
        emit_serializer(&mut writer, strct);
        writer.empty_line();
    }

    if let Some(namespace) = &spec.globals.cpp_namespace {
        writer.line(format!("}}  // namespace {}", namespace));
    }

    writer.finish()
}

/// The bson-type assertion guarding a field's extraction, if any. Fields
/// typed "any" are the one unguarded case.
fn type_check_predicate(field: &BoundField, element: &str) -> Option<String> {
    if field.is_any_type() {
        return None;
    }
    let bson_types = field.bson_types();
    if bson_types.len() == 1 {
        let bson_type = bson_types[0];
        if bson_type == "bindata" {
            let subtype = field.bindata_subtype().unwrap_or("generic");
            let cpp_subtype = bson::cpp_bindata_subtype(subtype).unwrap_or("BinDataGeneral");
            return Some(format!(
                "ctxt.checkAndAssertBinDataType({}, {})",
                element, cpp_subtype
            ));
        }
        let cpp_name = bson::cpp_bson_type_name(bson_type).unwrap_or("Object");
        Some(format!("ctxt.checkAndAssertType({}, {})", element, cpp_name))
    } else {
        let names: Vec<&str> = bson_types
            .iter()
            .map(|t| bson::cpp_bson_type_name(t).unwrap_or("Object"))
            .collect();
        Some(format!(
            "ctxt.checkAndAssertTypes({}, {{{}}})",
            element,
            names.join(", ")
        ))
    }
}

/// The expression producing a scalar field's storage value from a wire
/// element. `element` names the element variable in scope.
fn extraction_expr(field: &BoundField, element: &str) -> String {
    let (cpp_type, deserializer) = match &field.field_type {
        BoundFieldType::Scalar {
            cpp_type,
            deserializer,
            ..
        } => (cpp_type.as_str(), deserializer.as_deref()),
        _ => return String::new(),
    };
    let bson_types = field.bson_types();
    let single = if bson_types.len() == 1 {
        Some(bson_types[0])
    } else {
        None
    };

    match single {
        // String fields extract a view first and hand it to the routine.
        Some("string") => match deserializer {
            Some(routine) => routine_call(routine, &format!("{}.valueStringData()", element)),
            None => format!("{}.str()", element),
        },
        // Object fields extract the sub-document; a routine is mandatory.
        Some("object") => match deserializer {
            Some(routine) => routine_call(routine, &format!("{}.Obj()", element)),
            None => format!("{}.Obj()", element),
        },
        Some("bindata") => {
            let raw = if cpp_type == "std::array<std::uint8_t, 16>" {
                format!("{}.uuid()", element)
            } else {
                format!("{}._binDataVector()", element)
            };
            match deserializer {
                Some(routine) => routine_call(routine, &raw),
                None => raw,
            }
        }
        // "any" and every remaining scalar hand the raw element through.
        _ => match deserializer {
            Some(routine) => routine_call(routine, element),
            None => match single {
                Some("double") => format!("{}._numberDouble()", element),
                Some("bool") => format!("{}.boolean()", element),
                Some("date") => format!("{}.date()", element),
                Some("int") => format!("{}._numberInt()", element),
                Some("long") => format!("{}._numberLong()", element),
                Some("decimal") => format!("{}._numberDecimal()", element),
                Some("timestamp") => format!("{}.timestamp()", element),
                Some("objectid") => format!("{}.OID()", element),
                _ => element.to_string(),
            },
        },
    }
}

fn emit_deserializer(writer: &mut CodeWriter, strct: &BoundStruct) {
    let info = StructTypeInfo::new(strct);
    let class_name = info.class_name().to_string();

    writer.block(&info.parse_method().definition_header(), "}", |writer| {
        writer.line(format!("{} object;", class_name));
        writer.line("std::set<StringData> usedFields;");
        writer.empty_line();

        writer.block("for (const auto& element : bsonObject) {", "}", |writer| {
            writer.line("const auto fieldName = element.fieldNameStringData();");
            writer.empty_line();
            writer.line("auto push_result = usedFields.insert(fieldName);");
            writer.block(
                "if (MONGO_unlikely(push_result.second == false)) {",
                "}",
                |writer| {
                    writer.line("ctxt.throwDuplicateField(element);");
                },
            );
            writer.empty_line();

            let mut first = true;
            for field in &strct.fields {
                let open = if first {
                    format!("if (fieldName == {}) {{", field_constant(field))
                } else {
                    format!("else if (fieldName == {}) {{", field_constant(field))
                };
                first = false;
                writer.block(&open, "}", |writer| {
                    emit_field_deserialization(writer, field);
                });
            }

            // Struct-level strictness decides the fate of unknown names.
            let close = if first { "if (true) {" } else { "else {" };
            writer.block(close, "}", |writer| {
                if strct.strict {
                    writer.line("ctxt.throwUnknownField(fieldName);");
                } else {
                    writer.line("// ignore unknown fields");
                }
            });
        });
        writer.empty_line();

        emit_required_field_pass(writer, strct);
        writer.line("return object;");
    });
}

fn emit_field_deserialization(writer: &mut CodeWriter, field: &BoundField) {
    if field.ignore {
        writer.line("// ignore field");
        return;
    }
    if field.array {
        emit_array_deserialization(writer, field);
        return;
    }

    let assign_target = format!("object.{}", member_name(field));

    if let Some(struct_name) = field.struct_type() {
        let predicate = type_check_predicate(field, "element").unwrap();
        writer.block(&format!("if ({}) {{", predicate), "}", |writer| {
            writer.line("const auto localObject = element.Obj();");
            writer.line(format!(
                "{} = {}::parse(ctxt, localObject);",
                assign_target, struct_name
            ));
        });
        return;
    }

    let expr = extraction_expr(field, "element");
    match type_check_predicate(field, "element") {
        Some(predicate) => {
            writer.block(&format!("if ({}) {{", predicate), "}", |writer| {
                writer.line(format!("{} = {};", assign_target, expr));
            });
        }
        None => {
            writer.line(format!("{} = {};", assign_target, expr));
        }
    }
}

/// Arrays deserialize element-by-element, insisting the element keys are
/// sequential zero-based integers in wire order.
fn emit_array_deserialization(writer: &mut CodeWriter, field: &BoundField) {
    let member = member_name(field);
    let constant = field_constant(field);
    let element_storage = element_storage_type(field);

    writer.line("std::uint32_t expectedFieldNumber{0};");
    writer.line(format!(
        "const IDLParserErrorContext arrayCtxt({}, &ctxt);",
        constant
    ));
    writer.line(format!("std::vector<{}> values;", element_storage));
    writer.empty_line();
    writer.line("const BSONObj arrayObject = element.Obj();");
    writer.block(
        "for (const auto& arrayElement : arrayObject) {",
        "}",
        |writer| {
            writer.line("const auto arrayFieldName = arrayElement.fieldNameStringData();");
            writer.line("std::uint32_t fieldNumber;");
            writer.empty_line();
            writer.line(
                "Status status = parseNumberFromString(arrayFieldName, &fieldNumber);",
            );
            writer.block("if (status.isOK()) {", "}", |writer| {
                writer.block(
                    "if (fieldNumber != expectedFieldNumber) {",
                    "}",
                    |writer| {
                        writer.line(
                            "arrayCtxt.throwBadArrayFieldNumberSequence(fieldNumber, expectedFieldNumber);",
                        );
                    },
                );
                writer.empty_line();
                if let Some(struct_name) = field.struct_type() {
                    let predicate = array_type_check(field).unwrap();
                    writer.block(&format!("if ({}) {{", predicate), "}", |writer| {
                        writer.line(format!(
                            "values.emplace_back({}::parse(arrayCtxt, arrayElement.Obj()));",
                            struct_name
                        ));
                    });
                } else {
                    let expr = extraction_expr(field, "arrayElement");
                    match array_type_check(field) {
                        Some(predicate) => {
                            writer.block(&format!("if ({}) {{", predicate), "}", |writer| {
                                writer.line(format!("values.emplace_back({});", expr));
                            });
                        }
                        None => {
                            writer.line(format!("values.emplace_back({});", expr));
                        }
                    }
                }
                writer.line("++expectedFieldNumber;");
            });
            writer.block("else {", "}", |writer| {
                writer.line("arrayCtxt.throwBadArrayFieldNumberValue(arrayFieldName);");
            });
        },
    );
    writer.line(format!("object.{} = std::move(values);", member));
}

fn array_type_check(field: &BoundField) -> Option<String> {
    type_check_predicate(field, "arrayElement")
        .map(|p| p.replace("ctxt.", "arrayCtxt."))
}

/// The storage type of one array element.
fn element_storage_type(field: &BoundField) -> String {
    let mut scalar = field.clone();
    scalar.array = false;
    scalar.optional = false;
    CppTypeInfo::for_field(&scalar).storage_type()
}

/// After the wire scan, every non-ignored, non-optional field must have
/// appeared or carry a default.
fn emit_required_field_pass(writer: &mut CodeWriter, strct: &BoundStruct) {
    let mut emitted = false;
    for field in &strct.fields {
        if field.ignore || field.optional {
            continue;
        }
        writer.block(
            &format!(
                "if (usedFields.find({}) == usedFields.end()) {{",
                field_constant(field)
            ),
            "}",
            |writer| match &field.default {
                Some(default) => {
                    writer.line(format!(
                        "object.{} = {};",
                        member_name(field),
                        default_literal(field, default)
                    ));
                }
                None => {
                    writer.line(format!(
                        "ctxt.throwMissingField({});",
                        field_constant(field)
                    ));
                }
            },
        );
        emitted = true;
    }
    if emitted {
        writer.empty_line();
    }
}

/// Defaults are pasted as C++ expressions; bare string defaults become
/// string literals.
fn default_literal(field: &BoundField, default: &str) -> String {
    let is_string = matches!(
        &field.field_type,
        BoundFieldType::Scalar { cpp_type, .. } if cpp_type == "std::string"
    );
    if is_string && !default.starts_with('"') {
        quote(default)
    } else {
        default.to_string()
    }
}

fn emit_serializer(writer: &mut CodeWriter, strct: &BoundStruct) {
    let info = StructTypeInfo::new(strct);

    writer.block(&info.serialize_method().definition_header(), "}", |writer| {
        let mut first = true;
        for field in &strct.fields {
            if field.ignore {
                continue;
            }
            if !first {
                writer.empty_line();
            }
            first = false;

            if field.optional {
                let member = member_name(field);
                writer.block(
                    &format!("if ({}.is_initialized()) {{", member),
                    "}",
                    |writer| {
                        emit_field_serialization(writer, field, &format!("{}.get()", member));
                    },
                );
            } else {
                emit_field_serialization(writer, field, &member_name(field));
            }
        }
    });
}

fn emit_field_serialization(writer: &mut CodeWriter, field: &BoundField, value: &str) {
    let constant = field_constant(field);

    // Nested structs delegate to their own serializer via a sub-builder.
    if field.struct_type().is_some() {
        if field.array {
            writer.block("{", "}", |writer| {
                writer.line(format!(
                    "BSONArrayBuilder arrayBuilder(builder->subarrayStart({}));",
                    constant
                ));
                writer.block(
                    &format!("for (const auto& item : {}) {{", value),
                    "}",
                    |writer| {
                        writer.line(
                            "BSONObjBuilder subObjBuilder(arrayBuilder.subobjStart());",
                        );
                        writer.line("item.serialize(&subObjBuilder);");
                    },
                );
            });
        } else {
            writer.block("{", "}", |writer| {
                writer.line(format!(
                    "BSONObjBuilder subObjBuilder(builder->subobjStart({}));",
                    constant
                ));
                writer.line(format!("{}.serialize(&subObjBuilder);", value));
            });
        }
        return;
    }

    if let Some(serializer) = field.serializer() {
        emit_custom_serialization(writer, field, value, serializer);
        return;
    }

    // Plain append; bindata storage representations need the size/data
    // overload, and the two approved containers expose it differently only
    // in type, not spelling.
    let bson_types = field.bson_types();
    let is_bindata = bson_types.len() == 1 && bson_types[0] == "bindata";
    if is_bindata {
        if field.array {
            writer.block("{", "}", |writer| {
                writer.line(format!(
                    "BSONArrayBuilder arrayBuilder(builder->subarrayStart({}));",
                    constant
                ));
                writer.block(
                    &format!("for (const auto& item : {}) {{", value),
                    "}",
                    |writer| {
                        writer.line(format!(
                            "arrayBuilder.appendBinData(item.size(), {}, item.data());",
                            bindata_subtype_enum(field)
                        ));
                    },
                );
            });
        } else {
            writer.line(format!(
                "builder->appendBinData({}, {}.size(), {}, {}.data());",
                constant,
                value,
                bindata_subtype_enum(field),
                value
            ));
        }
        return;
    }

    writer.line(format!("builder->append({}, {});", constant, value));
}

fn bindata_subtype_enum(field: &BoundField) -> &'static str {
    field
        .bindata_subtype()
        .and_then(bson::cpp_bindata_subtype)
        .unwrap_or("BinDataGeneral")
}

/// Custom serializer dispatch by bson type family.
fn emit_custom_serialization(
    writer: &mut CodeWriter,
    field: &BoundField,
    value: &str,
    serializer: &str,
) {
    let constant = field_constant(field);
    let bson_types = field.bson_types();
    let single = if bson_types.len() == 1 {
        Some(bson_types[0])
    } else {
        None
    };

    if field.array {
        writer.block("{", "}", |writer| {
            writer.line(format!(
                "BSONArrayBuilder arrayBuilder(builder->subarrayStart({}));",
                constant
            ));
            writer.block(
                &format!("for (const auto& item : {}) {{", value),
                "}",
                |writer| match single {
                    Some("string") => {
                        writer.line(format!(
                            "arrayBuilder.append({});",
                            routine_call(serializer, "item")
                        ));
                    }
                    Some("bindata") => {
                        writer.line(format!("auto binValue = {};", routine_call(serializer, "item")));
                        writer.line(format!(
                            "arrayBuilder.appendBinData(binValue.size(), {}, binValue.data());",
                            bindata_subtype_enum(field)
                        ));
                    }
                    _ => {
                        writer.line(format!(
                            "BSONObjBuilder subObjBuilder(arrayBuilder.subobjStart());",
                        ));
                        writer.line(format!(
                            "{};",
                            routine_call_with_args(serializer, "item", "&subObjBuilder")
                        ));
                    }
                },
            );
        });
        return;
    }

    match single {
        Some("string") => {
            writer.line(format!(
                "builder->append({}, {});",
                constant,
                routine_call(serializer, value)
            ));
        }
        Some("bindata") => {
            writer.block("{", "}", |writer| {
                writer.line(format!("auto binValue = {};", routine_call(serializer, value)));
                writer.line(format!(
                    "builder->appendBinData({}, binValue.size(), {}, binValue.data());",
                    constant,
                    bindata_subtype_enum(field)
                ));
            });
        }
        _ => {
            writer.line(format!(
                "{};",
                routine_call_with_args(
                    serializer,
                    value,
                    &format!("{}, builder", constant)
                )
            ));
        }
    }
}
