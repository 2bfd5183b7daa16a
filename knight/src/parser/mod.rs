//! Prefix-notation parser
//!
//! Every Knight expression starts with a token that fixes how many operands
//! follow, so a single token of lookahead is enough. Anything after the first
//! complete expression is ignored.

use std::sync::Arc;

use crate::ast::{Builtin, Call, Node, Program, Span};
use crate::error::{CompileError, Result};
use crate::interp::Globals;
use crate::lexer::{tokenize, Token};
use crate::value::{Str, Value};


const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Parse tokens into AST, binding variables to cells in `globals`
pub fn parse(
    _filename: &str,
    source: &str,
    tokens: Vec<(Token, Span)>,
    globals: &Globals,
) -> Result<Program> {
    let mut parser = Parser {
        tokens: tokens.into_iter(),
        globals,
        eof: Span::new(source.len(), source.len()),
    };
    let root = parser.expression()?;
    Ok(Program::new(root))
}

/// Tokenize and parse in one step
pub fn parse_program(source: &str, globals: &Globals) -> Result<Program> {
    let tokens = tokenize(source)?;
    parse("<eval>", source, tokens, globals)
}

struct Parser<'g> {
    tokens: std::vec::IntoIter<(Token, Span)>,
    globals: &'g Globals,
    eof: Span,
}

impl Parser<'_> {
    fn expression(&mut self) -> Result<Arc<Node>> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.expression_inner())
    }

    fn expression_inner(&mut self) -> Result<Arc<Node>> {
        let Some((token, span)) = self.tokens.next() else {
            return Err(CompileError::parser("unexpected end of input", self.eof));
        };

        if let Some(op) = token.unary_op() {
            let operand = self.expression()?;
            return Ok(Arc::new(Node::Unary { op, operand }));
        }

        if let Some(op) = token.binary_op() {
            let lhs = self.expression()?;
            let rhs = self.expression()?;
            return Ok(Arc::new(Node::Binary { op, lhs, rhs }));
        }

        let node = match token {
            Token::IntLit(digits) => {
                let n = digits.parse::<i64>().map_err(|_| {
                    CompileError::parser(format!("integer literal {digits} is out of range"), span)
                })?;
                Node::Literal(Value::Int(n))
            }
            Token::StringLit(text) => Node::Literal(Value::Str(Str::from_string(text))),
            Token::True => Node::Literal(Value::Bool(true)),
            Token::False => Node::Literal(Value::Bool(false)),
            Token::Null => Node::Literal(Value::Null),
            Token::Variable(name) => Node::Variable(self.globals.lookup(&name)),
            Token::Word(name) => {
                let builtin = Builtin::from_word(&name)
                    .ok_or_else(|| CompileError::unknown_function(name.as_str(), span))?;
                let args = (0..builtin.arity())
                    .map(|_| self.expression())
                    .collect::<Result<Vec<_>>>()?;
                Node::Call(Call {
                    name: name.into_boxed_str(),
                    builtin,
                    args,
                })
            }
            other => {
                return Err(CompileError::parser(format!("unexpected token: {other}"), span));
            }
        };
        Ok(Arc::new(node))
    }
}
