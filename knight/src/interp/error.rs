//! Runtime errors for the interpreter

use std::fmt;

/// Runtime error during interpretation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operator applied to an unsupported operand type
    TypeMismatch,
    /// Division or modulo by zero, or zero raised to a negative power
    DivisionError,
    /// Read of a variable that was never assigned
    UndefinedVariable,
    /// Assignment to something other than a variable
    InvalidAssignment,
    /// Unrecognized operator or function
    UnknownOperation,
    /// Shell command failed to spawn or exited unsuccessfully
    ExternalProcess,
    /// Input or output failure
    IoError,
    /// String range outside the string or off a character boundary
    IndexOutOfBounds,
    /// `EVAL` of text that does not parse
    Parse,
    /// Control flow: `QUIT` with an exit code
    Quit(i32),
}

impl RuntimeError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError {
            kind,
            message: message.into(),
        }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, message)
    }

    pub fn division_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DivisionError, message)
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::new(
            ErrorKind::UndefinedVariable,
            format!("attempted to access undefined variable {name}"),
        )
    }

    pub fn invalid_assignment(target: &str) -> Self {
        Self::new(ErrorKind::InvalidAssignment, format!("cannot assign to {target}"))
    }

    pub fn unknown_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownOperation, message)
    }

    pub fn external_process(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalProcess, message)
    }

    pub fn io_error(msg: &str) -> Self {
        Self::new(ErrorKind::IoError, format!("IO error: {msg}"))
    }

    pub fn index_out_of_bounds(start: i64, count: i64, len: usize) -> Self {
        Self::new(
            ErrorKind::IndexOutOfBounds,
            format!("range {start}+{count} out of bounds for length {len}"),
        )
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn quit(code: i32) -> Self {
        Self::new(ErrorKind::Quit(code), format!("quit with code {code}"))
    }

    /// The exit code if this is a `QUIT` request.
    pub fn quit_code(&self) -> Option<i32> {
        match self.kind {
            ErrorKind::Quit(code) => Some(code),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

impl From<std::io::Error> for RuntimeError {
    fn from(e: std::io::Error) -> Self {
        RuntimeError::io_error(&e.to_string())
    }
}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
