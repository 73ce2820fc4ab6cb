//! Method descriptors for generated struct classes. The generator renders
//! the same method twice, once as a declaration in the header and once as a
//! definition header in the source file; describing methods as data keeps
//! the two spellings in sync.

use crate::ast::BoundStruct;

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub class_name: String,
    pub name: String,
    pub return_type: String,
    pub args: Vec<String>,
    pub is_static: bool,
    pub is_const: bool,
}

impl MethodInfo {
    /// The in-class declaration, e.g.
    /// `static Foo parse(const IDLParserErrorContext& ctxt, const BSONObj& bsonObject);`
    pub fn declaration(&self) -> String {
        let mut decl = String::new();
        if self.is_static {
            decl.push_str("static ");
        }
        decl.push_str(&self.return_type);
        decl.push(' ');
        decl.push_str(&self.name);
        decl.push('(');
        decl.push_str(&self.args.join(", "));
        decl.push(')');
        if self.is_const {
            decl.push_str(" const");
        }
        decl.push(';');
        decl
    }

    /// The out-of-class definition header, e.g.
    /// `Foo Foo::parse(const IDLParserErrorContext& ctxt, const BSONObj& bsonObject) {`
    pub fn definition_header(&self) -> String {
        let mut defn = String::new();
        defn.push_str(&self.return_type);
        defn.push(' ');
        defn.push_str(&self.class_name);
        defn.push_str("::");
        defn.push_str(&self.name);
        defn.push('(');
        defn.push_str(&self.args.join(", "));
        defn.push(')');
        if self.is_const {
            defn.push_str(" const");
        }
        defn.push_str(" {");
        defn
    }
}

/// The fixed public surface of one generated struct class.
#[derive(Debug)]
pub struct StructTypeInfo<'a> {
    strct: &'a BoundStruct,
}

impl<'a> StructTypeInfo<'a> {
    pub fn new(strct: &'a BoundStruct) -> Self {
        StructTypeInfo { strct }
    }

    /// Struct names are author-controlled and used verbatim as class names.
    pub fn class_name(&self) -> &str {
        &self.strct.name
    }

    /// The static named-constructor-style deserializer.
    pub fn parse_method(&self) -> MethodInfo {
        MethodInfo {
            class_name: self.strct.name.clone(),
            name: "parse".to_string(),
            return_type: self.strct.name.clone(),
            args: vec![
                "const IDLParserErrorContext& ctxt".to_string(),
                "const BSONObj& bsonObject".to_string(),
            ],
            is_static: true,
            is_const: false,
        }
    }

    /// The instance serializer.
    pub fn serialize_method(&self) -> MethodInfo {
        MethodInfo {
            class_name: self.strct.name.clone(),
            name: "serialize".to_string(),
            return_type: "void".to_string(),
            args: vec!["BSONObjBuilder* builder".to_string()],
            is_static: false,
            is_const: true,
        }
    }
}
