//! Parser: generic document tree -> syntax tree.
//!
//! Shape validation happens here: every node is checked against the kind the
//! grammar expects before its value is read. The parser never stops at the
//! first error; it finishes its full pass over sibling nodes and returns the
//! aggregate, so one compile surfaces every fixable problem at once. Symbol
//! table population (with duplicate detection) is a side effect of parsing
//! the type/struct/command sections.

use crate::document::{MappingNode, Node, ScalarNode};
use crate::error::ErrorCollection;
use crate::syntax::{
    Command, CommandNamespace, Field, Global, IdlSpec, NameRef, Struct, SymbolTable, Type,
};

/// Parse a loaded document into a syntax tree plus its symbol table.
pub fn parse(root: &Node) -> Result<IdlSpec, ErrorCollection> {
    let mut errors = ErrorCollection::new();

    let mapping = match root {
        Node::Mapping(m) => m,
        other => {
            errors.add_illegal_node(other.loc(), "IDL root", "mapping", other.kind_name());
            return Err(errors);
        }
    };

    let mut globals: Option<Global> = None;
    let mut symbols = SymbolTable::new();

    for (key, value) in &mapping.entries {
        match key.value.as_str() {
            "global" => {
                if globals.is_some() {
                    errors.add_duplicate_node(&key.loc, "global");
                    continue;
                }
                if let Some(section) = expect_mapping(&mut errors, "global", value) {
                    globals = Some(parse_global(&mut errors, key, section));
                }
            }
            "type" => {
                if let Some(section) = expect_mapping(&mut errors, "type", value) {
                    if let Some(ty) = parse_type(&mut errors, key, section) {
                        symbols.add_type(&mut errors, ty);
                    }
                }
            }
            "struct" => {
                if let Some(section) = expect_mapping(&mut errors, "struct", value) {
                    if let Some(strct) = parse_struct(&mut errors, key, section, false) {
                        symbols.add_struct(&mut errors, strct);
                    }
                }
            }
            "command" => {
                if let Some(section) = expect_mapping(&mut errors, "command", value) {
                    if let Some(command) = parse_command(&mut errors, key, section) {
                        symbols.add_command(&mut errors, command);
                    }
                }
            }
            other => errors.add_unknown_root(&key.loc, other),
        }
    }

    if errors.has_errors() {
        return Err(errors);
    }

    let globals = globals.unwrap_or_else(|| Global::empty(mapping.loc.clone()));
    Ok(IdlSpec { globals, symbols })
}

fn expect_mapping<'n>(
    errors: &mut ErrorCollection,
    key: &str,
    node: &'n Node,
) -> Option<&'n MappingNode> {
    match node {
        Node::Mapping(m) => Some(m),
        other => {
            errors.add_illegal_node(other.loc(), key, "mapping", other.kind_name());
            None
        }
    }
}

fn expect_scalar<'n>(
    errors: &mut ErrorCollection,
    key: &str,
    node: &'n Node,
) -> Option<&'n ScalarNode> {
    match node {
        Node::Scalar(s) => Some(s),
        other => {
            errors.add_illegal_node(other.loc(), key, "scalar", other.kind_name());
            None
        }
    }
}

/// A list-or-scalar field: a bare scalar reads as a singleton list.
fn expect_string_list(
    errors: &mut ErrorCollection,
    key: &str,
    node: &Node,
) -> Option<Vec<ScalarNode>> {
    match node {
        Node::Scalar(s) => Some(vec![s.clone()]),
        Node::Sequence(seq) => {
            let mut items = Vec::new();
            for item in &seq.items {
                match item {
                    Node::Scalar(s) => items.push(s.clone()),
                    other => {
                        errors.add_illegal_node(other.loc(), key, "scalar", other.kind_name());
                        return None;
                    }
                }
            }
            Some(items)
        }
        other => {
            errors.add_illegal_node(other.loc(), key, "scalar or sequence", other.kind_name());
            None
        }
    }
}

/// Boolean keys accept only the literal scalars `true` and `false`.
fn expect_bool(errors: &mut ErrorCollection, key: &str, node: &Node) -> Option<bool> {
    let scalar = expect_scalar(errors, key, node)?;
    match scalar.value.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        other => {
            errors.add_invalid_bool(&scalar.loc, key, other);
            None
        }
    }
}

/// Track seen keys within one mapping level; a repeated single-valued key is
/// a duplicate-node error, never an overwrite.
fn check_duplicate(errors: &mut ErrorCollection, seen: &mut Vec<String>, key: &ScalarNode) -> bool {
    if seen.iter().any(|k| k == &key.value) {
        errors.add_duplicate_node(&key.loc, &key.value);
        return true;
    }
    seen.push(key.value.clone());
    false
}

fn parse_global(errors: &mut ErrorCollection, key: &ScalarNode, section: &MappingNode) -> Global {
    let mut global = Global::empty(key.loc.clone());
    let mut seen = Vec::new();

    for (entry_key, value) in &section.entries {
        if check_duplicate(errors, &mut seen, entry_key) {
            continue;
        }
        match entry_key.value.as_str() {
            "cpp_namespace" => {
                if let Some(s) = expect_scalar(errors, "cpp_namespace", value) {
                    global.cpp_namespace = Some(s.value.clone());
                }
            }
            "cpp_includes" => {
                if let Some(items) = expect_string_list(errors, "cpp_includes", value) {
                    global.cpp_includes = items.into_iter().map(|s| s.value).collect();
                }
            }
            other => errors.add_unknown_node(&entry_key.loc, "global", other),
        }
    }

    global
}

fn parse_type(
    errors: &mut ErrorCollection,
    key: &ScalarNode,
    section: &MappingNode,
) -> Option<Type> {
    let mut seen = Vec::new();
    let mut name: Option<String> = None;
    let mut ty = Type {
        loc: key.loc.clone(),
        name: String::new(),
        description: None,
        cpp_type: None,
        bson_serialization_type: Vec::new(),
        bindata_subtype: None,
        serializer: None,
        deserializer: None,
        default: None,
    };

    for (entry_key, value) in &section.entries {
        if check_duplicate(errors, &mut seen, entry_key) {
            continue;
        }
        match entry_key.value.as_str() {
            "name" => {
                if let Some(s) = expect_scalar(errors, "name", value) {
                    ty.loc = s.loc.clone();
                    name = Some(s.value.clone());
                }
            }
            "description" => {
                if let Some(s) = expect_scalar(errors, "description", value) {
                    ty.description = Some(s.value.clone());
                }
            }
            "cpp_type" => {
                if let Some(s) = expect_scalar(errors, "cpp_type", value) {
                    ty.cpp_type = Some(s.value.clone());
                }
            }
            "bson_serialization_type" => {
                if let Some(items) = expect_string_list(errors, "bson_serialization_type", value) {
                    ty.bson_serialization_type = items.into_iter().map(|s| s.value).collect();
                }
            }
            "bindata_subtype" => {
                if let Some(s) = expect_scalar(errors, "bindata_subtype", value) {
                    ty.bindata_subtype = Some(s.value.clone());
                }
            }
            "serializer" => {
                if let Some(s) = expect_scalar(errors, "serializer", value) {
                    ty.serializer = Some(s.value.clone());
                }
            }
            "deserializer" => {
                if let Some(s) = expect_scalar(errors, "deserializer", value) {
                    ty.deserializer = Some(s.value.clone());
                }
            }
            "default" => {
                if let Some(s) = expect_scalar(errors, "default", value) {
                    ty.default = Some(s.value.clone());
                }
            }
            other => errors.add_unknown_node(&entry_key.loc, "type", other),
        }
    }

    if name.is_none() {
        errors.add_missing_required_key(&key.loc, "type", "name");
    }
    if ty.cpp_type.is_none() {
        errors.add_missing_required_key(&key.loc, "type", "cpp_type");
    }
    if ty.bson_serialization_type.is_empty() {
        errors.add_missing_required_key(&key.loc, "type", "bson_serialization_type");
    }

    let name = name?;
    if ty.cpp_type.is_none() || ty.bson_serialization_type.is_empty() {
        return None;
    }
    ty.name = name;
    Some(ty)
}

fn parse_struct(
    errors: &mut ErrorCollection,
    key: &ScalarNode,
    section: &MappingNode,
    for_command: bool,
) -> Option<Struct> {
    let section_name = if for_command { "command" } else { "struct" };
    let mut seen = Vec::new();
    let mut name: Option<String> = None;
    let mut strct = Struct {
        loc: key.loc.clone(),
        name: String::new(),
        description: None,
        strict: true,
        fields: Vec::new(),
        chained_types: Vec::new(),
    };
    let mut saw_fields = false;
    let mut fields_valid = false;

    // Fields may precede the name key; look it up front so field-level
    // diagnostics can say which struct they belong to.
    let declared_name = section
        .entries
        .iter()
        .find(|(k, _)| k.value == "name")
        .and_then(|(_, v)| v.as_scalar())
        .map(|s| s.value.clone())
        .unwrap_or_default();

    for (entry_key, value) in &section.entries {
        if check_duplicate(errors, &mut seen, entry_key) {
            continue;
        }
        match entry_key.value.as_str() {
            "name" => {
                if let Some(s) = expect_scalar(errors, "name", value) {
                    strct.loc = s.loc.clone();
                    name = Some(s.value.clone());
                }
            }
            "description" => {
                if let Some(s) = expect_scalar(errors, "description", value) {
                    strct.description = Some(s.value.clone());
                }
            }
            "strict" => {
                if let Some(b) = expect_bool(errors, "strict", value) {
                    strct.strict = b;
                }
            }
            "fields" => {
                saw_fields = true;
                if let Some(fields) = parse_fields(errors, &declared_name, value) {
                    strct.fields = fields;
                    fields_valid = true;
                }
            }
            "chained_types" => {
                if let Some(items) = expect_string_list(errors, "chained_types", value) {
                    strct.chained_types = items
                        .into_iter()
                        .map(|s| NameRef {
                            name: s.value,
                            loc: s.loc,
                        })
                        .collect();
                }
            }
            // namespace is consumed by parse_command before delegating here
            "namespace" if for_command => {}
            other => errors.add_unknown_node(&entry_key.loc, section_name, other),
        }
    }

    let name = match name {
        Some(n) => n,
        None => {
            errors.add_missing_required_key(&key.loc, section_name, "name");
            return None;
        }
    };
    strct.name = name;

    if !saw_fields {
        errors.add_missing_required_key(&key.loc, section_name, "fields");
        return None;
    }
    if fields_valid && strct.fields.is_empty() {
        errors.add_empty_field_list(&key.loc, &strct.name);
    }

    Some(strct)
}

fn parse_command(
    errors: &mut ErrorCollection,
    key: &ScalarNode,
    section: &MappingNode,
) -> Option<Command> {
    let mut namespace: Option<CommandNamespace> = None;
    let mut saw_namespace = false;

    for (entry_key, value) in &section.entries {
        if entry_key.value == "namespace" {
            if saw_namespace {
                // parse_struct reports the duplicate-node error
                continue;
            }
            saw_namespace = true;
            if let Some(s) = expect_scalar(errors, "namespace", value) {
                match CommandNamespace::parse(&s.value) {
                    Some(ns) => namespace = Some(ns),
                    None => {
                        let command_name = section
                            .entries
                            .iter()
                            .find(|(k, _)| k.value == "name")
                            .and_then(|(_, v)| v.as_scalar())
                            .map(|s| s.value.clone())
                            .unwrap_or_default();
                        errors.add_bad_command_namespace(&s.loc, &command_name, &s.value);
                    }
                }
            }
        }
    }

    let strct = parse_struct(errors, key, section, true)?;
    if !saw_namespace {
        errors.add_missing_required_key(&key.loc, "command", "namespace");
        return None;
    }
    let namespace = namespace?;
    Some(Command { strct, namespace })
}

fn parse_fields(errors: &mut ErrorCollection, owner: &str, node: &Node) -> Option<Vec<Field>> {
    let mapping = match node {
        Node::Mapping(m) => m,
        Node::Scalar(s) if s.value.is_empty() => {
            // An explicit `fields:` with nothing under it.
            return Some(Vec::new());
        }
        other => {
            errors.add_illegal_node(other.loc(), "fields", "mapping", other.kind_name());
            return None;
        }
    };

    let mut fields: Vec<Field> = Vec::new();
    for (field_key, value) in &mapping.entries {
        if fields.iter().any(|f| f.name == field_key.value) {
            errors.add_duplicate_field_name(&field_key.loc, owner, &field_key.value);
            continue;
        }
        if field_key.value == "array" || field_key.value.starts_with("array<") {
            errors.add_array_field_name(&field_key.loc, &field_key.value);
            continue;
        }
        let parsed = match value {
            // Shorthand: `name: typename`
            Node::Scalar(s) => Some(Field::shorthand(
                field_key.loc.clone(),
                &field_key.value,
                &s.value,
            )),
            Node::Mapping(m) => parse_field_expanded(errors, field_key, m),
            other => {
                errors.add_illegal_node(
                    other.loc(),
                    &field_key.value,
                    "scalar or mapping",
                    other.kind_name(),
                );
                None
            }
        };
        if let Some(field) = parsed {
            fields.push(field);
        }
    }
    Some(fields)
}

fn parse_field_expanded(
    errors: &mut ErrorCollection,
    field_key: &ScalarNode,
    section: &MappingNode,
) -> Option<Field> {
    let mut seen = Vec::new();
    let mut type_name: Option<String> = None;
    let mut field = Field::shorthand(field_key.loc.clone(), &field_key.value, "");

    for (entry_key, value) in &section.entries {
        if check_duplicate(errors, &mut seen, entry_key) {
            continue;
        }
        match entry_key.value.as_str() {
            "type" => {
                if let Some(s) = expect_scalar(errors, "type", value) {
                    type_name = Some(s.value.clone());
                }
            }
            "description" => {
                if let Some(s) = expect_scalar(errors, "description", value) {
                    field.description = Some(s.value.clone());
                }
            }
            "cpp_type" => {
                if let Some(s) = expect_scalar(errors, "cpp_type", value) {
                    field.cpp_type = Some(s.value.clone());
                }
            }
            "bson_serialization_type" => {
                if let Some(items) = expect_string_list(errors, "bson_serialization_type", value) {
                    field.bson_serialization_type =
                        items.into_iter().map(|s| s.value).collect();
                }
            }
            "bindata_subtype" => {
                if let Some(s) = expect_scalar(errors, "bindata_subtype", value) {
                    field.bindata_subtype = Some(s.value.clone());
                }
            }
            "serializer" => {
                if let Some(s) = expect_scalar(errors, "serializer", value) {
                    field.serializer = Some(s.value.clone());
                }
            }
            "deserializer" => {
                if let Some(s) = expect_scalar(errors, "deserializer", value) {
                    field.deserializer = Some(s.value.clone());
                }
            }
            "default" => {
                if let Some(s) = expect_scalar(errors, "default", value) {
                    field.default = Some(s.value.clone());
                }
            }
            "optional" => {
                if let Some(b) = expect_bool(errors, "optional", value) {
                    field.optional = b;
                }
            }
            "ignore" => {
                if let Some(b) = expect_bool(errors, "ignore", value) {
                    field.ignore = b;
                }
            }
            other => errors.add_unknown_node(&entry_key.loc, "field", other),
        }
    }

    let type_name = match type_name {
        Some(t) => t,
        None => {
            errors.add_missing_required_key(&field_key.loc, "field", "type");
            return None;
        }
    };
    field.type_name = type_name;
    Some(field)
}
