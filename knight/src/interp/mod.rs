//! Tree-walking interpreter

mod env;
mod error;
mod eval;

pub use env::{Globals, Variable};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::Interpreter;
