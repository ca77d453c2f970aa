//! Turns `bs` source text into HIR in one pass: the lexer and parser
//! here build `bsc_hir::Proc` directly, with no separate AST stage.

mod error;
mod lexer;
mod parser;
mod scope;

pub use error::{render, CompileError, ParseError, SemanticError};
pub use parser::parse_source;
