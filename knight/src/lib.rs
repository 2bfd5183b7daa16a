//! Knight interpreter library
//!
//! Tokenizer, prefix parser and tree-walking evaluator for the Knight
//! programming language, with process-wide string interning.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod repl;
pub mod value;

pub use ast::Span;
pub use error::{CompileError, Result};
pub use interp::{Globals, Interpreter, RuntimeError};
pub use value::Value;
