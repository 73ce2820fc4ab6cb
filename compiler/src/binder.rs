//! Binder: syntax tree -> bound AST.
//!
//! Phase A validates every declared type in isolation against the
//! serialization rules. Phase B binds each struct: field type references are
//! resolved against the symbol table, type-level attributes are merged with
//! field-level overrides, and the merged result is validated again since an
//! override can change the bson-type/cpp-type interaction. Phase C expands
//! chained types into synthesized fields. All phases aggregate errors; a
//! non-empty collection yields no bound spec at all.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ast::{BoundField, BoundFieldType, BoundGlobal, BoundSpec, BoundStruct};
use crate::bson;
use crate::document::SourceLocation;
use crate::error::ErrorCollection;
use crate::syntax::{CommandNamespace, Field, IdlSpec, Struct, SymbolRef, Type};

/// Custom (de)serializers on non-string scalar types must operate on the
/// raw wire element; the routine name carries this marker by convention.
const ELEMENT_MARKER: &str = "BSONElement";

/// The only accepted fixed-width integer spellings.
const CANONICAL_INT_TYPES: [&str; 4] = [
    "std::int32_t",
    "std::int64_t",
    "std::uint32_t",
    "std::uint64_t",
];

/// Approved container aliases for bindata storage.
const APPROVED_CONTAINER_TYPES: [&str; 2] =
    ["std::array<std::uint8_t, 16>", "std::vector<std::uint8_t>"];

lazy_static! {
    // Single-word numeric builtins banned in favor of fixed-width aliases.
    static ref BANNED_BUILTIN: Regex = Regex::new(
        r"\b(char|wchar_t|char16_t|char32_t|float|signed|unsigned|int|long|short)\b"
    )
    .unwrap();
    // Any explicit fixed-width alias; only the canonical std:: spellings
    // above are acceptable matches.
    static ref FIXED_WIDTH_INT: Regex = Regex::new(r"\b(u?int(8|16|32|64)_t)\b").unwrap();
}

/// Bind a parsed spec, or return every rule violation found.
pub fn bind(spec: &IdlSpec) -> Result<BoundSpec, ErrorCollection> {
    let mut errors = ErrorCollection::new();

    // Phase A: every declared type in isolation.
    for ty in spec.symbols.types() {
        validate_type(&mut errors, ty);
    }

    // Phase B/C: structs, then commands, each in declaration order.
    let mut structs = Vec::new();
    for strct in spec.symbols.structs() {
        if let Some(bound) = bind_struct(&mut errors, spec, strct, None) {
            structs.push(bound);
        }
    }
    for command in spec.symbols.commands() {
        if let Some(bound) = bind_struct(&mut errors, spec, &command.strct, Some(command.namespace))
        {
            structs.push(bound);
        }
    }

    if errors.has_errors() {
        return Err(errors);
    }

    Ok(BoundSpec {
        globals: BoundGlobal {
            cpp_namespace: spec.globals.cpp_namespace.clone(),
            cpp_includes: spec.globals.cpp_includes.clone(),
        },
        structs,
    })
}

fn validate_type(errors: &mut ErrorCollection, ty: &Type) {
    if ty.name.starts_with("array<") {
        errors.add_array_type_name(&ty.loc, &ty.name);
    }
    validate_type_properties(
        errors,
        &ty.loc,
        &ty.name,
        ty.cpp_type.as_deref().unwrap_or(""),
        &ty.bson_serialization_type,
        ty.bindata_subtype.as_deref(),
        ty.serializer.as_deref(),
        ty.deserializer.as_deref(),
        ty.default.as_deref(),
    );
}

/// The shared serialization-correctness rules, run per type in phase A and
/// again per field on the merged attributes in phase B.
#[allow(clippy::too_many_arguments)]
fn validate_type_properties(
    errors: &mut ErrorCollection,
    loc: &SourceLocation,
    owner: &str,
    cpp_type: &str,
    bson_types: &[String],
    bindata_subtype: Option<&str>,
    serializer: Option<&str>,
    deserializer: Option<&str>,
    default: Option<&str>,
) {
    validate_cpp_type(errors, loc, owner, cpp_type);

    if bson_types.len() == 1 {
        let bson_type = bson_types[0].as_str();
        if bson_type == "any" {
            // "any" disables scalar-type validation but mandates custom
            // deserialization.
            if deserializer.is_none() {
                errors.add_missing_deserializer(loc, owner, "any");
            }
            return;
        }
        if !bson::is_valid_bson_type(bson_type) {
            errors.add_bad_bson_type(loc, owner, bson_type);
            return;
        }
        if bson_type == "bindata" {
            match bindata_subtype {
                None => errors.add_missing_bindata_subtype(loc, owner),
                Some(subtype) if !bson::is_valid_bindata_subtype(subtype) => {
                    errors.add_bad_bindata_subtype(loc, owner, subtype)
                }
                Some(_) => {}
            }
            if default.is_some() {
                errors.add_bindata_no_default(loc, owner);
            }
        } else if bindata_subtype.is_some() {
            errors.add_unexpected_bindata_subtype(loc, owner);
        }
        if bson_type == "object" {
            if deserializer.is_none() {
                errors.add_missing_deserializer(loc, owner, "object");
            }
            if serializer.is_none() {
                errors.add_missing_serializer(loc, owner, "object");
            }
        }
        // Only "string" supports fully custom serialization; every other
        // scalar's custom routine must go through the raw element.
        if bson::is_scalar_bson_type(bson_type) && bson_type != "string" && bson_type != "bindata" {
            for routine in [serializer, deserializer].iter().flatten() {
                if !routine.contains(ELEMENT_MARKER) {
                    errors.add_custom_scalar_serialization(loc, owner, routine);
                }
            }
        }
    } else {
        for bson_type in bson_types {
            if bson_type == "any" || bson_type == "bindata" {
                errors.add_bad_bson_type(loc, owner, bson_type);
            } else if !bson::is_valid_bson_type(bson_type) {
                errors.add_bad_bson_type(loc, owner, bson_type);
            } else if !bson::is_scalar_bson_type(bson_type) {
                errors.add_bad_bson_type_list(loc, owner, bson_type);
            }
        }
        // No single extraction expression fits several wire types; the
        // value must come through a custom routine.
        if bson_types.len() > 1 && deserializer.is_none() {
            errors.add_missing_deserializer(loc, owner, "a bson type list");
        }
    }
}

fn validate_cpp_type(errors: &mut ErrorCollection, loc: &SourceLocation, owner: &str, cpp_type: &str) {
    if cpp_type.is_empty() {
        return;
    }
    if cpp_type == "StringData" {
        errors.add_no_string_data(loc, owner);
        return;
    }
    if CANONICAL_INT_TYPES.contains(&cpp_type) || APPROVED_CONTAINER_TYPES.contains(&cpp_type) {
        return;
    }
    if BANNED_BUILTIN.is_match(cpp_type) {
        errors.add_banned_cpp_type(loc, owner, cpp_type);
        return;
    }
    if FIXED_WIDTH_INT.is_match(cpp_type) {
        errors.add_non_canonical_int(loc, owner, cpp_type);
    }
}

fn bind_struct(
    errors: &mut ErrorCollection,
    spec: &IdlSpec,
    strct: &Struct,
    namespace: Option<CommandNamespace>,
) -> Option<BoundStruct> {
    let mut fields = Vec::new();
    for field in &strct.fields {
        if let Some(bound) = bind_field(errors, spec, field) {
            fields.push(bound);
        }
    }

    // Phase C: chained types flatten as synthesized fields after the
    // declared ones. Chaining leaves field identity open, so strictness
    // must be off.
    if !strct.chained_types.is_empty() && strct.strict {
        errors.add_chained_requires_non_strict(&strct.loc, &strct.name);
    }
    for chained in &strct.chained_types {
        let ty = match spec.symbols.resolve_type(&chained.name) {
            Some(ty) => ty,
            None => {
                errors.add_chained_type_not_found(&chained.loc, &strct.name, &chained.name);
                continue;
            }
        };
        // A name collision with an already-bound field is dropped without a
        // report; re-chaining an already-present type must stay safe.
        if fields.iter().any(|f| f.name == ty.name) {
            continue;
        }
        fields.push(BoundField {
            loc: chained.loc.clone(),
            name: ty.name.clone(),
            description: ty.description.clone(),
            optional: false,
            array: false,
            chained: true,
            ignore: false,
            default: ty.default.clone(),
            field_type: BoundFieldType::Scalar {
                cpp_type: ty.cpp_type.clone().unwrap_or_default(),
                bson_serialization_type: ty.bson_serialization_type.clone(),
                bindata_subtype: ty.bindata_subtype.clone(),
                serializer: ty.serializer.clone(),
                deserializer: ty.deserializer.clone(),
            },
        });
    }

    Some(BoundStruct {
        name: strct.name.clone(),
        description: strct.description.clone(),
        strict: strct.strict,
        namespace,
        fields,
    })
}

/// Unwrap one level of `array<...>`; deeper nesting is not expressible.
fn unwrap_array_type<'a>(
    errors: &mut ErrorCollection,
    field: &'a Field,
) -> Option<(&'a str, bool)> {
    let type_name = field.type_name.as_str();
    if let Some(inner) = type_name
        .strip_prefix("array<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        if inner.is_empty() || inner.starts_with("array<") || inner.contains('<') {
            errors.add_bad_array_type_name(&field.loc, &field.name, type_name);
            return None;
        }
        return Some((inner, true));
    }
    if type_name.starts_with("array<") {
        // Prefix without the closing ">".
        errors.add_bad_array_type_name(&field.loc, &field.name, type_name);
        return None;
    }
    Some((type_name, false))
}

fn bind_field(errors: &mut ErrorCollection, spec: &IdlSpec, field: &Field) -> Option<BoundField> {
    if field.ignore {
        return bind_ignored_field(errors, field);
    }

    let (type_name, array) = unwrap_array_type(errors, field)?;

    let resolved = match spec.symbols.resolve(type_name) {
        Some(symbol) => symbol,
        None => {
            errors.add_unknown_type(&field.loc, &field.name, type_name);
            return None;
        }
    };

    let (field_type, default) = match resolved {
        SymbolRef::Struct(s) => {
            bind_struct_field_checks(errors, field);
            (
                BoundFieldType::Struct {
                    name: s.name.clone(),
                },
                None,
            )
        }
        SymbolRef::Command(c) => {
            bind_struct_field_checks(errors, field);
            (
                BoundFieldType::Struct {
                    name: c.strct.name.clone(),
                },
                None,
            )
        }
        SymbolRef::Type(ty) => {
            // Merge type-level attributes with field-level overrides, then
            // validate the merged result; overrides can change the
            // bson-type/cpp-type interaction.
            let cpp_type = field
                .cpp_type
                .clone()
                .or_else(|| ty.cpp_type.clone())
                .unwrap_or_default();
            let bson_types = if field.bson_serialization_type.is_empty() {
                ty.bson_serialization_type.clone()
            } else {
                field.bson_serialization_type.clone()
            };
            let bindata_subtype = field
                .bindata_subtype
                .clone()
                .or_else(|| ty.bindata_subtype.clone());
            let serializer = field.serializer.clone().or_else(|| ty.serializer.clone());
            let deserializer = field
                .deserializer
                .clone()
                .or_else(|| ty.deserializer.clone());
            let default = field.default.clone().or_else(|| ty.default.clone());

            validate_type_properties(
                errors,
                &field.loc,
                &field.name,
                &cpp_type,
                &bson_types,
                bindata_subtype.as_deref(),
                serializer.as_deref(),
                deserializer.as_deref(),
                default.as_deref(),
            );

            (
                BoundFieldType::Scalar {
                    cpp_type,
                    bson_serialization_type: bson_types,
                    bindata_subtype,
                    serializer,
                    deserializer,
                },
                default,
            )
        }
    };

    if array && default.is_some() {
        errors.add_array_no_default(&field.loc, &field.name);
    }

    Some(BoundField {
        loc: field.loc.clone(),
        name: field.name.clone(),
        description: field.description.clone(),
        optional: field.optional,
        array,
        chained: false,
        ignore: false,
        default: if array { None } else { default },
        field_type,
    })
}

/// A field resolving to a struct carries no serialization attributes of its
/// own; any inline override is a conflict with the struct reference.
fn bind_struct_field_checks(errors: &mut ErrorCollection, field: &Field) {
    let overrides: [(&str, bool); 6] = [
        ("cpp_type", field.cpp_type.is_some()),
        (
            "bson_serialization_type",
            !field.bson_serialization_type.is_empty(),
        ),
        ("bindata_subtype", field.bindata_subtype.is_some()),
        ("serializer", field.serializer.is_some()),
        ("deserializer", field.deserializer.is_some()),
        ("default", field.default.is_some()),
    ];
    for (property, present) in overrides {
        if present {
            errors.add_struct_type_properties(&field.loc, &field.name, property);
        }
    }
}

/// Ignored fields are recognized by name during deserialization and skipped;
/// they may carry no other serialization properties.
fn bind_ignored_field(errors: &mut ErrorCollection, field: &Field) -> Option<BoundField> {
    if field.optional {
        errors.add_ignored_field_not_empty(&field.loc, &field.name, "optional");
    }
    if field.default.is_some() {
        errors.add_ignored_field_not_empty(&field.loc, &field.name, "default");
    }
    Some(BoundField {
        loc: field.loc.clone(),
        name: field.name.clone(),
        description: field.description.clone(),
        optional: false,
        array: false,
        chained: false,
        ignore: true,
        default: None,
        field_type: BoundFieldType::Ignored,
    })
}
