//! Expression AST nodes

use std::fmt;
use std::sync::Arc;

use super::{BinOp, Builtin, UnOp};
use crate::interp::Variable;
use crate::value::Value;

/// Expression
///
/// Children are shared so that `BLOCK` can capture a subtree without
/// copying it. Nodes are never mutated after parsing.
#[derive(Debug, Clone)]
pub enum Node {
    /// Literal value, already built through the caches
    Literal(Value),

    /// Variable reference, bound to its store cell at parse time
    Variable(Arc<Variable>),

    /// Unary operation
    Unary { op: UnOp, operand: Arc<Node> },

    /// Binary operation
    Binary {
        op: BinOp,
        lhs: Arc<Node>,
        rhs: Arc<Node>,
    },

    /// Builtin function call
    Call(Call),
}

/// A word-function call with exactly `builtin.arity()` arguments.
#[derive(Debug, Clone)]
pub struct Call {
    /// The word as written, e.g. `OUTPUT`
    pub name: Box<str>,
    pub builtin: Builtin,
    pub args: Vec<Arc<Node>>,
}

impl Call {
    pub fn arg(&self, i: usize) -> &Arc<Node> {
        &self.args[i]
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(v) => write!(f, "{v}"),
            Node::Variable(var) => write!(f, "(var {:?})", var.name()),
            Node::Unary { op, operand } => write!(f, "({op} {operand})"),
            Node::Binary { op, lhs, rhs } => write!(f, "({op} {lhs} {rhs})"),
            Node::Call(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return write!(f, "{}", self.name);
        }
        write!(f, "({}", self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        write!(f, ")")
    }
}
