//! Token definitions

use logos::Logos;

use crate::ast::{BinOp, UnOp};

/// Knight token
///
/// Grouping characters carry no meaning and are skipped with whitespace.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r()\[\]{}]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Literals
    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    IntLit(String),
    #[regex(r#""[^"]*""#, |lex| unquote(lex.slice()))]
    #[regex(r"'[^']*'", |lex| unquote(lex.slice()))]
    StringLit(String),
    #[regex(r"T[A-Z_]*", priority = 3)]
    True,
    #[regex(r"F[A-Z_]*", priority = 3)]
    False,
    #[regex(r"N[A-Z_]*", priority = 3)]
    Null,

    #[regex(r"[a-z_][a-z0-9_]*", |lex| lex.slice().to_string())]
    Variable(String),
    #[regex(r"[A-Z][A-Z_]*", |lex| lex.slice().to_string())]
    Word(String),

    // Symbol functions
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("!")]
    Bang,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("?")]
    Question,
    #[token("^")]
    Caret,
    #[token("`")]
    Backtick,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
}

fn unquote(s: &str) -> String {
    s[1..s.len() - 1].to_string()
}

impl Token {
    pub fn binary_op(&self) -> Option<BinOp> {
        Some(match self {
            Token::Amp => BinOp::And,
            Token::Pipe => BinOp::Or,
            Token::Plus => BinOp::Add,
            Token::Minus => BinOp::Sub,
            Token::Star => BinOp::Mul,
            Token::Slash => BinOp::Div,
            Token::Percent => BinOp::Mod,
            Token::Caret => BinOp::Exp,
            Token::Lt => BinOp::Less,
            Token::Gt => BinOp::Greater,
            Token::Question => BinOp::Equal,
            Token::Eq => BinOp::Assign,
            Token::Semi => BinOp::Chain,
            _ => return None,
        })
    }

    pub fn unary_op(&self) -> Option<UnOp> {
        match self {
            Token::Bang => Some(UnOp::Not),
            Token::Colon => Some(UnOp::Noop),
            Token::Backtick => Some(UnOp::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::IntLit(n) => write!(f, "{n}"),
            Token::StringLit(s) => write!(f, "{s:?}"),
            Token::True => write!(f, "TRUE"),
            Token::False => write!(f, "FALSE"),
            Token::Null => write!(f, "NULL"),
            Token::Variable(name) => write!(f, "{name}"),
            Token::Word(name) => write!(f, "{name}"),
            symbol => match (symbol.binary_op(), symbol.unary_op()) {
                (Some(op), _) => write!(f, "{}", op.symbol()),
                (None, Some(op)) => write!(f, "{}", op.symbol()),
                (None, None) => Ok(()),
            },
        }
    }
}
