//! Expression evaluator

use std::io::{self, BufRead, BufReader, Write};
use std::process::Command;
use std::sync::Arc;

use rand::Rng;

use super::env::Globals;
use super::error::{InterpResult, RuntimeError};
use crate::ast::{BinOp, Builtin, Call, Node, Program, UnOp};
use crate::error::CompileError;
use crate::parser;
use crate::value::{Block, Cache, Str, Value};

/// Stack growth parameters for deep recursion
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// The interpreter
///
/// Holds no evaluation state of its own beyond the variable store and the
/// I/O endpoints used by `PROMPT`, `OUTPUT` and `DUMP`.
pub struct Interpreter {
    globals: Arc<Globals>,
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl Interpreter {
    /// Create an interpreter reading stdin and writing stdout
    pub fn new(globals: Arc<Globals>) -> Self {
        Self::with_io(globals, BufReader::new(io::stdin()), io::stdout())
    }

    pub fn with_io(
        globals: Arc<Globals>,
        input: impl BufRead + 'static,
        output: impl Write + 'static,
    ) -> Self {
        Interpreter {
            globals,
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn globals(&self) -> &Arc<Globals> {
        &self.globals
    }

    /// Run a parsed program and return the value of its root expression.
    ///
    /// `QUIT` surfaces as an error of kind [`ErrorKind::Quit`](super::ErrorKind::Quit);
    /// output is flushed either way.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn execute(&mut self, program: &Program) -> InterpResult<Value> {
        Cache::global().warm();
        let result = self.eval(&program.root);
        self.output.flush()?;
        result
    }

    /// Evaluate an expression with automatic stack growth for deep recursion
    fn eval(&mut self, node: &Node) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(node))
    }

    /// Inner eval implementation
    ///
    /// Operands in tail position (the right side of `;`, `&`, `|` and the
    /// chosen branch of `IF`) are evaluated by looping rather than recursing.
    fn eval_inner(&mut self, mut node: &Node) -> InterpResult<Value> {
        loop {
            match node {
                Node::Literal(value) => return Ok(value.clone()),
                Node::Variable(var) => {
                    return match var.read()? {
                        Value::Block(block) => self.eval(block.expr()),
                        value => Ok(value),
                    };
                }
                Node::Unary { op, operand } => {
                    let value = self.eval(operand)?;
                    return self.eval_unary(*op, value);
                }
                Node::Binary { op, lhs, rhs } => match op {
                    BinOp::Chain => {
                        self.eval(lhs)?;
                        node = rhs.as_ref();
                    }
                    BinOp::And => {
                        let lhs = self.eval(lhs)?;
                        if !lhs.to_bool() {
                            return Ok(lhs);
                        }
                        node = rhs.as_ref();
                    }
                    BinOp::Or => {
                        let lhs = self.eval(lhs)?;
                        if lhs.to_bool() {
                            return Ok(lhs);
                        }
                        node = rhs.as_ref();
                    }
                    BinOp::Assign => return self.assign(lhs, rhs),
                    _ => {
                        let lhs = self.eval(lhs)?;
                        let rhs = self.eval(rhs)?;
                        return eval_binary(*op, lhs, rhs);
                    }
                },
                Node::Call(call) if call.builtin == Builtin::If => {
                    let condition = self.eval(call.arg(0))?;
                    let branch = if condition.to_bool() { call.arg(1) } else { call.arg(2) };
                    node = branch.as_ref();
                }
                Node::Call(call) => return self.eval_call(call),
            }
        }
    }

    fn assign(&mut self, target: &Node, rhs: &Node) -> InterpResult<Value> {
        let Node::Variable(var) = target else {
            return Err(RuntimeError::invalid_assignment(&target.to_string()));
        };
        let value = self.eval(rhs)?;
        var.write(value.clone());
        Ok(value)
    }

    fn eval_unary(&mut self, op: UnOp, value: Value) -> InterpResult<Value> {
        match op {
            UnOp::Not => Ok(Value::Bool(!value.to_bool())),
            UnOp::Noop => Ok(value),
            UnOp::System => self.system(&value.to_str()),
        }
    }

    fn eval_call(&mut self, call: &Call) -> InterpResult<Value> {
        match call.builtin {
            Builtin::Block => Ok(Value::Block(Block::new(Arc::clone(call.arg(0))))),
            Builtin::Call => {
                let expr = self.eval(call.arg(0))?.to_expression();
                self.eval(&expr)
            }
            Builtin::Dump => {
                let value = self.eval(call.arg(0))?;
                write!(self.output, "{}", value.dump())?;
                self.output.flush()?;
                Ok(Value::Null)
            }
            Builtin::Eval => {
                let source = self.eval(call.arg(0))?.to_str();
                self.eval_source(source)
            }
            Builtin::Get => {
                let string = self.eval(call.arg(0))?;
                let start = self.eval(call.arg(1))?;
                let count = self.eval(call.arg(2))?;
                get(&string.to_str(), start.to_int(), count.to_int())
            }
            Builtin::If => unreachable!("IF is evaluated in tail position by eval_inner"),
            Builtin::Length => {
                let value = self.eval(call.arg(0))?;
                Ok(Value::Int(value.to_str().len() as i64))
            }
            Builtin::Output => {
                let value = self.eval(call.arg(0))?;
                self.output(&value.to_str())
            }
            Builtin::Prompt => self.prompt(),
            Builtin::Quit => {
                let code = quit_code(self.eval(call.arg(0))?.to_int());
                tracing::debug!(code, "quit requested");
                Err(RuntimeError::quit(code))
            }
            Builtin::Random => Ok(Value::Int(rand::thread_rng().gen_range(0..=i64::MAX))),
            Builtin::Substitute => {
                let string = self.eval(call.arg(0))?;
                let start = self.eval(call.arg(1))?;
                let count = self.eval(call.arg(2))?;
                let replacement = self.eval(call.arg(3))?;
                substitute(string, start.to_int(), count.to_int(), &replacement.to_str())
            }
            Builtin::While => {
                while self.eval(call.arg(0))?.to_bool() {
                    self.eval(call.arg(1))?;
                }
                Ok(Value::Null)
            }
            Builtin::DumpAst => {
                write!(self.output, "{}", call.arg(0))?;
                self.output.flush()?;
                Ok(Value::Null)
            }
            Builtin::Ascii => {
                let value = self.eval(call.arg(0))?;
                ascii(value)
            }
        }
    }

    /// `EVAL`: parse and run text against this interpreter's variables.
    ///
    /// Parsed programs are cached by string instance, so only text that is
    /// the very same interned (or retained) string reuses a parse.
    fn eval_source(&mut self, source: Str) -> InterpResult<Value> {
        let program = match self.globals.program(&source) {
            Some(program) => {
                tracing::trace!(source = source.as_str(), "eval cache hit");
                program
            }
            None => {
                tracing::debug!(len = source.len(), "eval cache miss, parsing");
                let program = parser::parse_program(source.as_str(), &self.globals)
                    .map_err(|e| match e {
                        CompileError::UnknownFunction { name, .. } => {
                            RuntimeError::unknown_operation(format!("undefined function: {name}"))
                        }
                        other => RuntimeError::parse_error(other.to_string()),
                    })?;
                self.globals.insert_program(source, program.clone());
                program
            }
        };
        self.eval(&program.root)
    }

    fn output(&mut self, text: &Str) -> InterpResult<Value> {
        match text.as_str().strip_suffix('\\') {
            Some(text) => {
                self.output.write_all(text.as_bytes())?;
                self.output.flush()?;
            }
            None => {
                self.output.write_all(text.as_str().as_bytes())?;
                self.output.write_all(b"\n")?;
            }
        }
        Ok(Value::Null)
    }

    fn prompt(&mut self) -> InterpResult<Value> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Value::Null);
        }
        let len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(len);
        Ok(Value::Str(Str::from_string(line)))
    }

    fn system(&mut self, command: &Str) -> InterpResult<Value> {
        tracing::debug!(command = command.as_str(), "running shell command");
        self.output.flush()?;

        #[cfg(windows)]
        let result = Command::new("cmd").args(["/C", command.as_str()]).output();
        #[cfg(not(windows))]
        let result = Command::new("/bin/sh").args(["-c", command.as_str()]).output();

        let output = result.map_err(|e| {
            RuntimeError::external_process(format!("cannot run {:?}: {e}", command.as_str()))
        })?;
        if !output.status.success() {
            return Err(RuntimeError::external_process(format!(
                "command {:?} failed: {}",
                command.as_str(),
                output.status
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(Value::Str(Str::from_string(stdout)))
    }
}

/// Arithmetic and comparison operators. Both sides are already evaluated;
/// the right side is coerced to the type of the left.
fn eval_binary(op: BinOp, lhs: Value, rhs: Value) -> InterpResult<Value> {
    match op {
        BinOp::Add => add(lhs, rhs),
        BinOp::Sub => match lhs {
            Value::Int(a) => Ok(Value::Int(a.wrapping_sub(rhs.to_int()))),
            _ => Err(RuntimeError::type_mismatch(format!("cannot subtract from {}", lhs.type_name()))),
        },
        BinOp::Mul => mul(lhs, rhs),
        BinOp::Div => match lhs {
            Value::Int(a) => match rhs.to_int() {
                0 => Err(RuntimeError::division_error("cannot divide by 0")),
                b => Ok(Value::Int(a.wrapping_div(b))),
            },
            _ => Err(RuntimeError::type_mismatch(format!("cannot divide {}", lhs.type_name()))),
        },
        BinOp::Mod => match lhs {
            Value::Int(a) => match rhs.to_int() {
                b if b <= 0 => Err(RuntimeError::division_error(format!("cannot modulo by {b}"))),
                b => Ok(Value::Int(a.wrapping_rem(b))),
            },
            _ => Err(RuntimeError::type_mismatch(format!("cannot divide {}", lhs.type_name()))),
        },
        BinOp::Exp => match lhs {
            Value::Int(a) => exp(a, rhs.to_int()).map(Value::Int),
            _ => Err(RuntimeError::type_mismatch(format!("cannot exponentiate {}", lhs.type_name()))),
        },
        BinOp::Less => match &lhs {
            Value::Bool(a) => Ok(Value::Bool(!a & rhs.to_bool())),
            Value::Int(a) => Ok(Value::Bool(*a < rhs.to_int())),
            Value::Str(a) => Ok(Value::Bool(a.as_str() < rhs.to_str().as_str())),
            _ => Err(RuntimeError::type_mismatch(format!("cannot compare {}", lhs.type_name()))),
        },
        BinOp::Greater => match &lhs {
            Value::Bool(a) => Ok(Value::Bool(*a & !rhs.to_bool())),
            Value::Int(a) => Ok(Value::Bool(*a > rhs.to_int())),
            Value::Str(a) => Ok(Value::Bool(a.as_str() > rhs.to_str().as_str())),
            _ => Err(RuntimeError::type_mismatch(format!("cannot compare {}", lhs.type_name()))),
        },
        BinOp::Equal => Ok(Value::Bool(lhs.equal(&rhs))),
        BinOp::And | BinOp::Or | BinOp::Chain | BinOp::Assign => Err(RuntimeError::unknown_operation(
            format!("{op} is not an arithmetic operator"),
        )),
    }
}

fn add(lhs: Value, rhs: Value) -> InterpResult<Value> {
    match lhs {
        Value::Int(0) => Ok(Value::Int(rhs.to_int())),
        Value::Int(a) => Ok(Value::Int(a.wrapping_add(rhs.to_int()))),
        Value::Str(a) if a.is_empty() => Ok(Value::Str(rhs.to_str())),
        Value::Str(a) => {
            let b = rhs.to_str();
            if b.is_empty() {
                return Ok(Value::Str(a));
            }
            Ok(Value::Str(a.concat(&b)))
        }
        _ => Err(RuntimeError::type_mismatch(format!("cannot add to {}", lhs.type_name()))),
    }
}

fn mul(lhs: Value, rhs: Value) -> InterpResult<Value> {
    match lhs {
        Value::Int(a) => Ok(Value::Int(a.wrapping_mul(rhs.to_int()))),
        Value::Str(a) => {
            let count = rhs.to_int();
            let times = usize::try_from(count).map_err(|_| {
                RuntimeError::type_mismatch(format!("invalid string repeat count {count}"))
            })?;
            if a.len().checked_mul(times).is_none() {
                return Err(RuntimeError::type_mismatch(format!(
                    "string repeat count {count} is too large"
                )));
            }
            Ok(Value::Str(Str::from_string(a.as_str().repeat(times))))
        }
        _ => Err(RuntimeError::type_mismatch(format!("cannot multiply {}", lhs.type_name()))),
    }
}

/// Exit status for `QUIT`. Codes outside the `i32` range saturate.
fn quit_code(code: i64) -> i32 {
    i32::try_from(code).unwrap_or(if code < 0 { i32::MIN } else { i32::MAX })
}

/// Integer power with wrapping. Negative exponents truncate toward zero.
fn exp(base: i64, exponent: i64) -> InterpResult<i64> {
    if exponent < 0 {
        return match base {
            0 => Err(RuntimeError::division_error("cannot raise 0 to a negative power")),
            1 => Ok(1),
            -1 if exponent % 2 == 0 => Ok(1),
            -1 => Ok(-1),
            _ => Ok(0),
        };
    }

    let mut result: i64 = 1;
    let mut base = base;
    let mut exponent = exponent as u64;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exponent >>= 1;
    }
    Ok(result)
}

/// Validate `[start, start + count)` against a string of `len` bytes.
fn byte_range(start: i64, count: i64, len: usize) -> InterpResult<(usize, usize)> {
    let out_of_bounds = || RuntimeError::index_out_of_bounds(start, count, len);
    let begin = usize::try_from(start).map_err(|_| out_of_bounds())?;
    let count = usize::try_from(count).map_err(|_| out_of_bounds())?;
    let end = begin.checked_add(count).filter(|&end| end <= len).ok_or_else(out_of_bounds)?;
    Ok((begin, end))
}

fn slice(s: &Str, start: usize, end: usize) -> InterpResult<Str> {
    s.substring(start, end)
        .ok_or_else(|| RuntimeError::index_out_of_bounds(start as i64, (end - start) as i64, s.len()))
}

fn get(s: &Str, start: i64, count: i64) -> InterpResult<Value> {
    let (begin, end) = byte_range(start, count, s.len())?;
    if begin == end {
        return Ok(Value::Str(Cache::global().empty()));
    }
    if begin == 0 && end == s.len() {
        return Ok(Value::Str(s.clone()));
    }
    slice(s, begin, end).map(Value::Str)
}

fn substitute(string: Value, start: i64, count: i64, replacement: &Str) -> InterpResult<Value> {
    if count == 0 && replacement.is_empty() {
        return Ok(string);
    }

    let s = string.to_str();
    let len = s.len();
    let (begin, end) = byte_range(start, count, len)?;

    if replacement.is_empty() {
        if begin == 0 {
            if end == len {
                return Ok(Value::Str(Cache::global().empty()));
            }
            return slice(&s, end, len).map(Value::Str);
        }
        if begin == end {
            return Ok(Value::Str(s));
        }
        if end == len {
            return slice(&s, 0, begin).map(Value::Str);
        }
        let head = slice(&s, 0, begin)?;
        let tail = slice(&s, end, len)?;
        return Ok(Value::Str(head.concat(&tail)));
    }

    let head = slice(&s, 0, begin)?.concat(replacement);
    let tail = slice(&s, end, len)?;
    Ok(Value::Str(head.concat(&tail)))
}

fn ascii(value: Value) -> InterpResult<Value> {
    match &value {
        Value::Int(n) => {
            let c = u32::try_from(*n)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            Ok(Value::str(c.encode_utf8(&mut [0; 4])))
        }
        Value::Str(s) => match s.as_str().as_bytes().first() {
            Some(&b) => Ok(Value::Int(i64::from(b))),
            None => Err(RuntimeError::index_out_of_bounds(0, 1, 0)),
        },
        _ => Err(RuntimeError::type_mismatch(format!("cannot take ASCII of {}", value.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ErrorKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    fn run_with_input(source: &str, input: &str) -> (InterpResult<Value>, String) {
        let globals = Arc::new(Globals::new());
        let program = parser::parse_program(source, &globals).unwrap();
        let out = SharedBuf::default();
        let mut interp = Interpreter::with_io(
            globals,
            io::Cursor::new(input.as_bytes().to_vec()),
            out.clone(),
        );
        let result = interp.execute(&program);
        (result, out.contents())
    }

    fn run(source: &str) -> InterpResult<Value> {
        run_with_input(source, "").0
    }

    fn eval_ok(source: &str) -> Value {
        run(source).unwrap_or_else(|e| panic!("{source}: {e}"))
    }

    fn eval_err(source: &str) -> ErrorKind {
        run(source).expect_err(source).kind
    }

    fn s(text: &str) -> Value {
        Value::str(text)
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval_ok("123"), Value::Int(123));
        assert_eq!(eval_ok("\"foo\""), s("foo"));
        assert_eq!(eval_ok("TRUE"), Value::Bool(true));
        assert_eq!(eval_ok("F"), Value::Bool(false));
        assert_eq!(eval_ok("NULL"), Value::Null);
    }

    #[test]
    fn test_add() {
        assert_eq!(eval_ok("+ 1 2"), Value::Int(3));
        assert_eq!(eval_ok("+ 0 \"12\""), Value::Int(12));
        assert_eq!(eval_ok("+ 5 TRUE"), Value::Int(6));
        assert_eq!(eval_ok("+ \"foo\" \"bar\""), s("foobar"));
        assert_eq!(eval_ok("+ \"n\" 12"), s("n12"));
        assert_eq!(eval_ok("+ \"\" NULL"), s("null"));
        assert_eq!(eval_ok("+ \"x\" \"\""), s("x"));
        assert_eq!(eval_err("+ TRUE 1"), ErrorKind::TypeMismatch);
        assert_eq!(eval_err("+ NULL 1"), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_add_wraps() {
        assert_eq!(eval_ok("+ 9223372036854775807 1"), Value::Int(i64::MIN));
    }

    #[test]
    fn test_sub() {
        assert_eq!(eval_ok("- 5 7"), Value::Int(-2));
        assert_eq!(eval_ok("- 5 \"2\""), Value::Int(3));
        assert_eq!(eval_err("- \"5\" 2"), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_mul() {
        assert_eq!(eval_ok("* 6 7"), Value::Int(42));
        assert_eq!(eval_ok("* \"ab\" 3"), s("ababab"));
        assert_eq!(eval_ok("* \"ab\" 0"), s(""));
        assert_eq!(eval_err("* \"ab\" - 0 1"), ErrorKind::TypeMismatch);
        assert_eq!(eval_err("* FALSE 2"), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_div() {
        assert_eq!(eval_ok("/ 7 2"), Value::Int(3));
        assert_eq!(eval_ok("/ - 0 7 2"), Value::Int(-3));
        assert_eq!(eval_err("/ 1 0"), ErrorKind::DivisionError);
        assert_eq!(eval_err("/ 1 \"zero\""), ErrorKind::DivisionError);
        assert_eq!(eval_err("/ \"1\" 1"), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_mod() {
        assert_eq!(eval_ok("% 7 3"), Value::Int(1));
        assert_eq!(eval_ok("% - 0 7 3"), Value::Int(-1));
        assert_eq!(eval_err("% 7 0"), ErrorKind::DivisionError);
        assert_eq!(eval_err("% 7 - 0 3"), ErrorKind::DivisionError);
    }

    #[test]
    fn test_exp() {
        assert_eq!(eval_ok("^ 2 10"), Value::Int(1024));
        assert_eq!(eval_ok("^ 5 0"), Value::Int(1));
        assert_eq!(eval_ok("^ 0 0"), Value::Int(1));
        assert_eq!(eval_ok("^ 2 - 0 1"), Value::Int(0));
        assert_eq!(eval_ok("^ 1 - 0 5"), Value::Int(1));
        assert_eq!(eval_ok("^ - 0 1 - 0 3"), Value::Int(-1));
        assert_eq!(eval_ok("^ - 0 1 - 0 4"), Value::Int(1));
        assert_eq!(eval_err("^ 0 - 0 1"), ErrorKind::DivisionError);
        assert_eq!(eval_err("^ \"2\" 2"), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_less_and_greater() {
        assert_eq!(eval_ok("< FALSE TRUE"), Value::Bool(true));
        assert_eq!(eval_ok("< TRUE FALSE"), Value::Bool(false));
        assert_eq!(eval_ok("< 1 2"), Value::Bool(true));
        assert_eq!(eval_ok("< 2 \"10\""), Value::Bool(true));
        assert_eq!(eval_ok("< \"a\" \"b\""), Value::Bool(true));
        assert_eq!(eval_ok("< \"10\" 9"), Value::Bool(true));
        assert_eq!(eval_ok("> TRUE FALSE"), Value::Bool(true));
        assert_eq!(eval_ok("> FALSE TRUE"), Value::Bool(false));
        assert_eq!(eval_ok("> 2 1"), Value::Bool(true));
        assert_eq!(eval_ok("> \"b\" \"a\""), Value::Bool(true));
        assert_eq!(eval_ok("> \"a\" \"b\""), Value::Bool(false));
        assert_eq!(eval_err("< NULL 1"), ErrorKind::TypeMismatch);
        assert_eq!(eval_err("> NULL 1"), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_equal() {
        assert_eq!(eval_ok("? 1 1"), Value::Bool(true));
        assert_eq!(eval_ok("? 1 \"1\""), Value::Bool(false));
        assert_eq!(eval_ok("? \"foo\" + \"f\" \"oo\""), Value::Bool(true));
        assert_eq!(eval_ok("? NULL NULL"), Value::Bool(true));
        assert_eq!(eval_ok("? TRUE 1"), Value::Bool(false));
        assert_eq!(eval_ok("; = b BLOCK 1 ? b b"), Value::Bool(true));
    }

    #[test]
    fn test_and_or_short_circuit() {
        assert_eq!(eval_ok("& 0 undefined"), Value::Int(0));
        assert_eq!(eval_ok("& \"\" undefined"), s(""));
        assert_eq!(eval_ok("& 1 2"), Value::Int(2));
        assert_eq!(eval_ok("| 3 undefined"), Value::Int(3));
        assert_eq!(eval_ok("| NULL \"x\""), s("x"));
        assert_eq!(eval_err("& 1 undefined"), ErrorKind::UndefinedVariable);
    }

    #[test]
    fn test_not_and_noop() {
        assert_eq!(eval_ok("! 0"), Value::Bool(true));
        assert_eq!(eval_ok("! \"x\""), Value::Bool(false));
        assert_eq!(eval_ok(": 5"), Value::Int(5));
    }

    #[test]
    fn test_assign_then_read() {
        assert_eq!(eval_ok("; = x 5 x"), Value::Int(5));
        assert_eq!(eval_ok("= x \"v\""), s("v"));
        assert_eq!(eval_err("= 1 2"), ErrorKind::InvalidAssignment);
        assert_eq!(eval_err("x"), ErrorKind::UndefinedVariable);
    }

    #[test]
    fn test_chain_propagates_lhs_error() {
        assert_eq!(eval_ok("; 1 2"), Value::Int(2));
        assert_eq!(eval_err("; / 1 0 2"), ErrorKind::DivisionError);
    }

    #[test]
    fn test_block_and_call() {
        assert_eq!(eval_ok("CALL BLOCK + 1 2"), Value::Int(3));
        assert_eq!(eval_ok("CALL 7"), Value::Int(7));
        assert_eq!(
            eval_ok("; = n 3 ; = f BLOCK * n 2 ; = n 10 CALL f"),
            Value::Int(20)
        );
        assert!(matches!(eval_ok("BLOCK x"), Value::Block(_)));
    }

    #[test]
    fn test_variable_holding_block_evaluates_on_read() {
        assert_eq!(eval_ok("; = n 4 ; = f BLOCK + n 1 f"), Value::Int(5));
    }

    #[test]
    fn test_if() {
        assert_eq!(eval_ok("IF TRUE 1 undefined"), Value::Int(1));
        assert_eq!(eval_ok("IF \"\" undefined 2"), Value::Int(2));
    }

    #[test]
    fn test_nested_if_chain() {
        let source = format!("{}7", "IF FALSE 0 ".repeat(2_000));
        assert_eq!(eval_ok(&source), Value::Int(7));
        assert_eq!(eval_ok("IF TRUE IF FALSE 1 IF 1 2 3 4"), Value::Int(2));
    }

    #[test]
    fn test_while_loop_to_ten() {
        assert_eq!(eval_ok("; = i 0 ; WHILE < i 10 = i + i 1 i"), Value::Int(10));
        assert_eq!(eval_ok("WHILE FALSE undefined"), Value::Null);
    }

    #[test]
    fn test_length() {
        assert_eq!(eval_ok("LENGTH \"hello\""), Value::Int(5));
        assert_eq!(eval_ok("LENGTH 1234"), Value::Int(4));
        assert_eq!(eval_ok("LENGTH NULL"), Value::Int(4));
        assert_eq!(eval_ok("LENGTH \"\""), Value::Int(0));
    }

    #[test]
    fn test_ascii() {
        assert_eq!(eval_ok("ASCII 38"), s("&"));
        assert_eq!(eval_ok("ASCII \"Hello\""), Value::Int(72));
        assert_eq!(eval_ok("ASCII 1114112"), s("\u{FFFD}"));
        assert_eq!(eval_err("ASCII \"\""), ErrorKind::IndexOutOfBounds);
        assert_eq!(eval_err("ASCII TRUE"), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_get() {
        assert_eq!(eval_ok("GET \"foo\" 0 0"), s(""));
        assert_eq!(eval_ok("GET \"foo\" 3 0"), s(""));
        assert_eq!(eval_ok("GET \"foo\" 0 3"), s("foo"));
        assert_eq!(eval_ok("GET \"foo\" 1 1"), s("o"));
        assert_eq!(eval_ok("GET 12345 1 2"), s("23"));
        assert_eq!(eval_err("GET \"foo\" 2 2"), ErrorKind::IndexOutOfBounds);
        assert_eq!(eval_err("GET \"foo\" - 0 1 1"), ErrorKind::IndexOutOfBounds);
        assert_eq!(eval_err("GET \"é\" 0 1"), ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn test_get_returns_cached_instance() {
        let a = eval_ok("GET \"hello world\" 6 5");
        let b = eval_ok("GET \"hello world\" 6 5");
        match (a, b) {
            (Value::Str(a), Value::Str(b)) => {
                assert_eq!(a.as_str(), "world");
                assert!(a.same(&b));
            }
            other => panic!("expected strings, got {other:?}"),
        }
    }

    #[test]
    fn test_substitute() {
        assert_eq!(eval_ok("SUBSTITUTE \"foo\" 0 0 \"\""), s("foo"));
        assert_eq!(eval_ok("SUBSTITUTE \"foo\" 0 0 \"bar\""), s("barfoo"));
        assert_eq!(eval_ok("SUBSTITUTE \"foo\" 0 1 \"bar\""), s("baroo"));
        assert_eq!(eval_ok("SUBSTITUTE \"foo\" 3 0 \"d\""), s("food"));
        assert_eq!(eval_ok("SUBSTITUTE \"hello\" 0 5 \"\""), s(""));
        assert_eq!(eval_ok("SUBSTITUTE \"hello\" 0 2 \"\""), s("llo"));
        assert_eq!(eval_ok("SUBSTITUTE \"hello\" 3 2 \"\""), s("hel"));
        assert_eq!(eval_ok("SUBSTITUTE \"hello\" 1 3 \"\""), s("ho"));
        assert_eq!(eval_err("SUBSTITUTE \"foo\" 2 5 \"x\""), ErrorKind::IndexOutOfBounds);
    }

    #[test]
    fn test_substitute_noop_returns_original_instance() {
        let globals = Arc::new(Globals::new());
        let text = "x".repeat(64);
        globals.lookup("s").write(Value::Str(Str::new(&text)));
        let original = match globals.lookup("s").get() {
            Some(Value::Str(s)) => s,
            other => panic!("unexpected {other:?}"),
        };
        let program = parser::parse_program("SUBSTITUTE s 0 0 \"\"", &globals).unwrap();
        let mut interp = Interpreter::with_io(globals, io::empty(), io::sink());
        match interp.execute(&program).unwrap() {
            Value::Str(result) => assert!(result.same(&original)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_output() {
        let (result, out) = run_with_input("OUTPUT \"foo bar\"", "");
        assert_eq!(result.unwrap(), Value::Null);
        assert_eq!(out, "foo bar\n");

        let (_, out) = run_with_input("OUTPUT \"foo bar\\\"", "");
        assert_eq!(out, "foo bar");

        let (_, out) = run_with_input("; OUTPUT 1 ; OUTPUT TRUE OUTPUT NULL", "");
        assert_eq!(out, "1\ntrue\nnull\n");
    }

    #[test]
    fn test_dump() {
        let (result, out) = run_with_input("DUMP + 1 2", "");
        assert_eq!(result.unwrap(), Value::Null);
        assert_eq!(out, "Number(3)");
        let (_, out) = run_with_input("DUMP \"hi\"", "");
        assert_eq!(out, "String(hi)");
        let (_, out) = run_with_input("DUMP BLOCK 1", "");
        assert_eq!(out, "Block(Number(1))");
    }

    #[test]
    fn test_prompt() {
        let (result, _) = run_with_input("PROMPT", "first line\r\nsecond\n");
        assert_eq!(result.unwrap(), s("first line"));

        let (result, _) = run_with_input("; PROMPT PROMPT", "one\ntwo");
        assert_eq!(result.unwrap(), s("two"));

        let (result, _) = run_with_input("PROMPT", "");
        assert_eq!(result.unwrap(), Value::Null);
    }

    #[test]
    fn test_random_is_non_negative() {
        for _ in 0..20 {
            match eval_ok("RANDOM") {
                Value::Int(n) => assert!(n >= 0),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_quit_unwinds_with_code() {
        let (result, out) = run_with_input("; OUTPUT \"before\" ; QUIT 3 OUTPUT \"after\"", "");
        let err = result.unwrap_err();
        assert_eq!(err.quit_code(), Some(3));
        assert_eq!(out, "before\n");
    }

    #[test]
    fn test_quit_code_saturates() {
        let quit = |source: &str| run(source).unwrap_err().quit_code();
        assert_eq!(quit("QUIT 4294967297"), Some(i32::MAX));
        assert_eq!(quit("QUIT - 0 5000000000"), Some(i32::MIN));
        assert_eq!(quit("QUIT - 0 7"), Some(-7));
    }

    #[test]
    fn test_dump_ast_prints_unevaluated_argument() {
        let (result, out) = run_with_input("XD + 1 missing", "");
        assert_eq!(result.unwrap(), Value::Null);
        assert_eq!(out, "(add 1 (var \"missing\"))");
    }

    #[test]
    fn test_eval() {
        assert_eq!(eval_ok("EVAL \"+ 1 2\""), Value::Int(3));
        assert_eq!(eval_ok("; = x 4 EVAL \"* x x\""), Value::Int(16));
        assert_eq!(eval_ok("; EVAL \"= y 9\" y"), Value::Int(9));
        assert_eq!(eval_err("EVAL \"+ 1\""), ErrorKind::Parse);
        assert_eq!(eval_err("EVAL \"ZAP 1\""), ErrorKind::UnknownOperation);
    }

    #[test]
    fn test_eval_caches_by_instance() {
        let globals = Arc::new(Globals::new());
        let program =
            parser::parse_program("; = i 0 ; WHILE < i 5 = i EVAL \"+ i 1\" i", &globals).unwrap();
        let mut interp = Interpreter::with_io(Arc::clone(&globals), io::empty(), io::sink());
        assert_eq!(interp.execute(&program).unwrap(), Value::Int(5));
        assert_eq!(globals.cached_programs(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_system() {
        assert_eq!(eval_ok("` \"echo hi\""), s("hi\n"));
        assert_eq!(eval_err("` \"exit 3\""), ErrorKind::ExternalProcess);
    }

    #[test]
    fn test_deep_recursion() {
        let source = "; = n 0 ; = f BLOCK IF < n 20000 ; = n + n 1 CALL f n CALL f";
        assert_eq!(eval_ok(source), Value::Int(20000));
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let mut source = String::new();
        for _ in 0..2_000 {
            source.push_str("; = x 1 ");
        }
        source.push('x');
        assert_eq!(eval_ok(&source), Value::Int(1));
    }

    #[test]
    fn test_exp_helper() {
        assert_eq!(exp(3, 4).unwrap(), 81);
        assert_eq!(exp(-2, 3).unwrap(), -8);
        assert_eq!(exp(2, 64).unwrap(), 0);
        assert_eq!(exp(7, -2).unwrap(), 0);
    }

    proptest! {
        #[test]
        fn prop_div_truncates_toward_zero(a in any::<i64>(), b in any::<i64>().prop_filter("nonzero", |b| *b != 0)) {
            prop_assume!(!(a == i64::MIN && b == -1));
            let got = eval_binary(BinOp::Div, Value::Int(a), Value::Int(b)).unwrap();
            prop_assert_eq!(got, Value::Int((i128::from(a) / i128::from(b)) as i64));
        }

        #[test]
        fn prop_div_by_zero_fails(a in any::<i64>()) {
            let err = eval_binary(BinOp::Div, Value::Int(a), Value::Int(0)).unwrap_err();
            prop_assert_eq!(err.kind, ErrorKind::DivisionError);
        }

        #[test]
        fn prop_substring_twice_is_same_instance(text in "[a-z]{1,32}", a in 0usize..32, n in 0usize..32) {
            let src = Str::new(&text);
            let start = a.min(text.len());
            let end = (start + n).min(text.len());
            let first = slice(&src, start, end).unwrap();
            let second = slice(&src, start, end).unwrap();
            prop_assert!(first.same(&second));
        }
    }
}
