//! Syntax tree produced by the parser: the direct structural reading of the
//! input document, before any type resolution. The symbol table travels with
//! the tree; its lifetime is exactly one compile invocation.

use serde::Serialize;

use crate::document::SourceLocation;
use crate::error::ErrorCollection;

#[derive(Debug, Clone, Serialize)]
pub struct Global {
    pub loc: SourceLocation,
    pub cpp_namespace: Option<String>,
    pub cpp_includes: Vec<String>,
}

impl Global {
    pub fn empty(loc: SourceLocation) -> Self {
        Global {
            loc,
            cpp_namespace: None,
            cpp_includes: Vec::new(),
        }
    }
}

/// A declared serialization type.
#[derive(Debug, Clone, Serialize)]
pub struct Type {
    pub loc: SourceLocation,
    pub name: String,
    pub description: Option<String>,
    pub cpp_type: Option<String>,
    /// Ordered, non-empty once parsed; emptiness is a parse error.
    pub bson_serialization_type: Vec<String>,
    pub bindata_subtype: Option<String>,
    pub serializer: Option<String>,
    pub deserializer: Option<String>,
    pub default: Option<String>,
}

/// A struct member as written. Fields may carry inline type-level
/// attributes that override the referenced type during binding.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub loc: SourceLocation,
    pub name: String,
    pub description: Option<String>,
    pub type_name: String,
    pub cpp_type: Option<String>,
    pub bson_serialization_type: Vec<String>,
    pub bindata_subtype: Option<String>,
    pub serializer: Option<String>,
    pub deserializer: Option<String>,
    pub default: Option<String>,
    pub optional: bool,
    pub ignore: bool,
}

impl Field {
    /// A shorthand field (`name: typename`) with no extra attributes.
    pub fn shorthand(loc: SourceLocation, name: &str, type_name: &str) -> Self {
        Field {
            loc,
            name: name.to_string(),
            description: None,
            type_name: type_name.to_string(),
            cpp_type: None,
            bson_serialization_type: Vec::new(),
            bindata_subtype: None,
            serializer: None,
            deserializer: None,
            default: None,
            optional: false,
            ignore: false,
        }
    }
}

/// A named reference with its source location, used for chained types.
#[derive(Debug, Clone, Serialize)]
pub struct NameRef {
    pub name: String,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, Serialize)]
pub struct Struct {
    pub loc: SourceLocation,
    pub name: String,
    pub description: Option<String>,
    /// Unknown wire fields are errors during deserialization when strict.
    pub strict: bool,
    pub fields: Vec<Field>,
    pub chained_types: Vec<NameRef>,
}

/// How a command locates its namespace argument on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CommandNamespace {
    Ignored,
    ConcatenateWithDb,
}

impl CommandNamespace {
    pub fn parse(value: &str) -> Option<CommandNamespace> {
        match value {
            "ignored" => Some(CommandNamespace::Ignored),
            "concatenate_with_db" => Some(CommandNamespace::ConcatenateWithDb),
            _ => None,
        }
    }
}

/// A command is a struct with an additional namespace-handling mode.
#[derive(Debug, Clone, Serialize)]
pub struct Command {
    pub strct: Struct,
    pub namespace: CommandNamespace,
}

/// Registry of all declared names. Types, structs and commands share one
/// namespace: a struct may not reuse a type's name, and vice versa.
#[derive(Debug, Default, Serialize)]
pub struct SymbolTable {
    types: Vec<Type>,
    structs: Vec<Struct>,
    commands: Vec<Command>,
}

#[derive(Debug)]
pub enum SymbolRef<'a> {
    Type(&'a Type),
    Struct(&'a Struct),
    Command(&'a Command),
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    fn contains(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.name == name)
            || self.structs.iter().any(|s| s.name == name)
            || self.commands.iter().any(|c| c.strct.name == name)
    }

    /// Register a type, reporting a duplicate-symbol error on collision.
    pub fn add_type(&mut self, errors: &mut ErrorCollection, ty: Type) {
        if self.contains(&ty.name) {
            errors.add_duplicate_symbol(&ty.loc, &ty.name, "type");
            return;
        }
        self.types.push(ty);
    }

    pub fn add_struct(&mut self, errors: &mut ErrorCollection, strct: Struct) {
        if self.contains(&strct.name) {
            errors.add_duplicate_symbol(&strct.loc, &strct.name, "struct");
            return;
        }
        self.structs.push(strct);
    }

    pub fn add_command(&mut self, errors: &mut ErrorCollection, command: Command) {
        if self.contains(&command.strct.name) {
            errors.add_duplicate_symbol(&command.strct.loc, &command.strct.name, "command");
            return;
        }
        self.commands.push(command);
    }

    pub fn resolve(&self, name: &str) -> Option<SymbolRef<'_>> {
        if let Some(ty) = self.types.iter().find(|t| t.name == name) {
            return Some(SymbolRef::Type(ty));
        }
        if let Some(strct) = self.structs.iter().find(|s| s.name == name) {
            return Some(SymbolRef::Struct(strct));
        }
        if let Some(command) = self.commands.iter().find(|c| c.strct.name == name) {
            return Some(SymbolRef::Command(command));
        }
        None
    }

    pub fn resolve_type(&self, name: &str) -> Option<&Type> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn structs(&self) -> &[Struct] {
        &self.structs
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// The parser's output: the syntax tree and its symbol table as one unit.
#[derive(Debug, Serialize)]
pub struct IdlSpec {
    pub globals: Global,
    pub symbols: SymbolTable,
}
