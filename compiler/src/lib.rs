//! ridl-compiler
//!
//! This crate implements:
//!  1) A document loader for `.idl` files (an indentation-based subset),
//!  2) A parser building the syntax tree and symbol table,
//!  3) A binder resolving field types and validating serialization rules
//!     (`bind` → `BoundSpec`),
//!  4) C++ code generation (`generate` → header and source text),
//!  5) Error types (`IdlError`, `ErrorCollection`) with stable error codes.

pub mod ast;
pub mod binder;
pub mod bson;
pub mod cpp_types;
pub mod document;
pub mod error;
pub mod generator;
pub mod parser;
pub mod struct_types;
pub mod syntax;
pub mod utils;
pub mod writer;

pub use ast::BoundSpec;
pub use error::{ErrorCollection, ErrorEntry, ErrorId, IdlError};
pub use generator::{GeneratedCode, GeneratorOptions};

/// The result of a full compilation: the bound tree plus both generated
/// artifacts.
#[derive(Debug, Clone)]
pub struct CompiledIdl {
    pub spec: BoundSpec,
    pub code: GeneratedCode,
}

/// Load, parse, and bind one document without generating code.
pub fn check_text(file_name: &str, text: &str) -> Result<BoundSpec, IdlError> {
    let root = document::load(file_name, text)?;
    let spec = parser::parse(&root).map_err(IdlError::Compile)?;
    let bound = binder::bind(&spec).map_err(IdlError::Compile)?;
    Ok(bound)
}

/// Run the whole pipeline on one document. Each stage is all-or-nothing:
/// a stage with errors reports every error it found and no later stage
/// runs.
pub fn compile_text(
    file_name: &str,
    text: &str,
    options: &GeneratorOptions,
) -> Result<CompiledIdl, IdlError> {
    let bound = check_text(file_name, text)?;
    let code = generator::generate(&bound, options);
    Ok(CompiledIdl { spec: bound, code })
}
