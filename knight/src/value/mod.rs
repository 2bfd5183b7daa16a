//! Runtime values
//!
//! A [`Value`] is one of five variants. Integers, booleans and null are
//! stored inline and compared by value; strings are [`Str`] handles built
//! through the process-wide [`Cache`]; blocks hold an unevaluated node.

mod atoi;
pub mod cache;
pub mod string;
pub mod sync;

use std::fmt;
use std::sync::Arc;

use crate::ast::Node;

pub use atoi::atoi;
pub use cache::{Cache, CacheOptions, MAX_INTERN_INT, MAX_INTERN_STRING_LENGTH, MIN_INTERN_INT};
pub use string::{Identity, Str, Tag};

/// A deferred expression, produced by `BLOCK` and forced by `CALL`.
#[derive(Clone)]
pub struct Block(Arc<Node>);

impl Block {
    pub fn new(expr: Arc<Node>) -> Self {
        Block(expr)
    }

    /// The held expression.
    pub fn expr(&self) -> &Arc<Node> {
        &self.0
    }

    /// True when both blocks wrap the very same node.
    pub fn same(&self, other: &Block) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn dump(&self) -> String {
        match &*self.0 {
            Node::Literal(v) => format!("Block({})", v.dump()),
            _ => "Block(AST)".to_string(),
        }
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(Str),
    Block(Block),
}

impl Value {
    /// Build a string value through the global cache.
    pub fn str(text: &str) -> Self {
        Value::Str(Str::new(text))
    }

    /// Truthiness.
    ///
    /// # Panics
    ///
    /// Panics on a block; blocks are only valid as the argument of `CALL`.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Str(s) => !s.is_empty(),
            Value::Block(_) => panic!("a block cannot be converted into a bool"),
        }
    }

    /// Integer coercion.
    ///
    /// # Panics
    ///
    /// Panics on a block.
    pub fn to_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Int(n) => *n,
            Value::Str(s) => atoi(s.as_str()),
            Value::Block(_) => panic!("a block cannot be converted into an int"),
        }
    }

    /// String coercion. Always returns a cached instance for scalars.
    ///
    /// # Panics
    ///
    /// Panics on a block.
    pub fn to_str(&self) -> Str {
        match self {
            Value::Null => Cache::global().null_str(),
            Value::Bool(b) => Cache::global().bool_str(*b),
            Value::Int(n) => Str::from_int(*n),
            Value::Str(s) => s.clone(),
            Value::Block(_) => panic!("a block cannot be converted into a string"),
        }
    }

    /// The expression this value stands for: the held node of a block, or a
    /// literal node wrapping the value itself.
    pub fn to_expression(&self) -> Arc<Node> {
        match self {
            Value::Block(b) => b.expr().clone(),
            other => Arc::new(Node::Literal(other.clone())),
        }
    }

    /// Debug representation used by `DUMP`.
    pub fn dump(&self) -> String {
        match self {
            Value::Null => "Null()".to_string(),
            Value::Bool(b) => format!("Bool({b})"),
            Value::Int(n) => format!("Number({n})"),
            Value::Str(s) => format!("String({s})"),
            Value::Block(b) => b.dump(),
        }
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Block(_) => "block",
        }
    }

    /// Knight equality: same variant and same value, never coercing.
    /// Blocks are only equal to themselves.
    pub fn equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Block(a), Value::Block(b)) => a.same(b),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<Str> for Value {
    fn from(s: Str) -> Self {
        Value::Str(s)
    }
}

impl From<Block> for Value {
    fn from(b: Block) -> Self {
        Value::Block(b)
    }
}

/// Source-like rendering, used when printing syntax trees.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{:?}", s.as_str()),
            Value::Block(b) => write!(f, "(block {})", b.expr()),
        }
    }
}
