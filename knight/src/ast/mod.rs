//! Abstract Syntax Tree definitions

mod expr;
mod ops;
mod span;

pub use expr::*;
pub use ops::*;
pub use span::*;

use std::fmt;
use std::sync::Arc;

/// A parsed program: a single root expression.
#[derive(Debug, Clone)]
pub struct Program {
    pub root: Arc<Node>,
}

impl Program {
    pub fn new(root: Arc<Node>) -> Self {
        Program { root }
    }
}

/// Renders the tree as an s-expression.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(program {})", self.root)
    }
}
