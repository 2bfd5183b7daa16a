//! Operators and builtin functions

use std::fmt;

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    /// `!`
    Not,
    /// `:`
    Noop,
    /// `` ` ``
    System,
}

impl UnOp {
    pub fn symbol(self) -> char {
        match self {
            UnOp::Not => '!',
            UnOp::Noop => ':',
            UnOp::System => '`',
        }
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnOp::Not => write!(f, "not"),
            UnOp::Noop => write!(f, "noop"),
            UnOp::System => write!(f, "system"),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Less,
    Greater,
    Equal,
    Assign,
    Chain,
}

impl BinOp {
    pub fn symbol(self) -> char {
        match self {
            BinOp::And => '&',
            BinOp::Or => '|',
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
            BinOp::Mod => '%',
            BinOp::Exp => '^',
            BinOp::Less => '<',
            BinOp::Greater => '>',
            BinOp::Equal => '?',
            BinOp::Assign => '=',
            BinOp::Chain => ';',
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Mod => "mod",
            BinOp::Exp => "exp",
            BinOp::Less => "less",
            BinOp::Greater => "greater",
            BinOp::Equal => "equal",
            BinOp::Assign => "assign",
            BinOp::Chain => "chain",
        };
        write!(f, "{name}")
    }
}

/// Word functions, identified by their first letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Ascii,
    Block,
    Call,
    Dump,
    Eval,
    Get,
    If,
    Length,
    Output,
    Prompt,
    Quit,
    Random,
    Substitute,
    While,
    /// `XD`: print the argument's syntax tree without evaluating it
    DumpAst,
}

impl Builtin {
    /// Resolve a word such as `OUTPUT` or `O`.
    pub fn from_word(word: &str) -> Option<Self> {
        Some(match word.chars().next()? {
            'A' => Builtin::Ascii,
            'B' => Builtin::Block,
            'C' => Builtin::Call,
            'D' => Builtin::Dump,
            'E' => Builtin::Eval,
            'G' => Builtin::Get,
            'I' => Builtin::If,
            'L' => Builtin::Length,
            'O' => Builtin::Output,
            'P' => Builtin::Prompt,
            'Q' => Builtin::Quit,
            'R' => Builtin::Random,
            'S' => Builtin::Substitute,
            'W' => Builtin::While,
            'X' if word == "XD" => Builtin::DumpAst,
            _ => return None,
        })
    }

    /// Number of arguments, fixed at parse time.
    pub fn arity(self) -> usize {
        match self {
            Builtin::Prompt | Builtin::Random => 0,
            Builtin::Ascii
            | Builtin::Block
            | Builtin::Call
            | Builtin::Dump
            | Builtin::Eval
            | Builtin::Length
            | Builtin::Output
            | Builtin::Quit
            | Builtin::DumpAst => 1,
            Builtin::While => 2,
            Builtin::Get | Builtin::If => 3,
            Builtin::Substitute => 4,
        }
    }
}
