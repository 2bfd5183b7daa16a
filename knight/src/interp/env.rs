//! Variable store
//!
//! Knight has a single global namespace. Every variable name maps to one
//! [`Variable`] cell for the lifetime of its [`Globals`]; the parser binds
//! variable nodes straight to these cells, so reads and writes at run time
//! never go through the name map.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::error::{InterpResult, RuntimeError};
use crate::ast::Program;
use crate::value::sync::{Cell, Guarded};
use crate::value::{Identity, Str, Value};

/// A named, mutable slot. Unset until first assigned.
pub struct Variable {
    name: Box<str>,
    value: Cell<Option<Value>>,
}

impl Variable {
    fn new(name: &str) -> Self {
        Variable {
            name: name.into(),
            value: Guarded::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value, if assigned.
    pub fn get(&self) -> Option<Value> {
        self.value.with(|slot| slot.clone())
    }

    /// Current value, or an undefined-variable error.
    pub fn read(&self) -> InterpResult<Value> {
        self.get()
            .ok_or_else(|| RuntimeError::undefined_variable(&self.name))
    }

    pub fn write(&self, value: Value) {
        // The old value is dropped outside the lock.
        let _old = self.value.with(|slot| slot.replace(value));
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({:?})", self.name)
    }
}

/// Name-to-cell map plus the programs parsed by `EVAL` against it.
pub struct Globals {
    vars: Cell<FxHashMap<Box<str>, Arc<Variable>>>,
    // The source string is kept alive so an address identity is never reused.
    programs: Cell<FxHashMap<Identity, (Str, Program)>>,
}

impl Globals {
    pub fn new() -> Self {
        Globals {
            vars: Guarded::new(FxHashMap::default()),
            programs: Guarded::new(FxHashMap::default()),
        }
    }

    /// The cell for `name`, created on first use.
    pub fn lookup(&self, name: &str) -> Arc<Variable> {
        self.vars.with(|vars| {
            if let Some(var) = vars.get(name) {
                return Arc::clone(var);
            }
            let var = Arc::new(Variable::new(name));
            vars.insert(name.into(), Arc::clone(&var));
            var
        })
    }

    /// Number of variables referenced so far.
    pub fn len(&self) -> usize {
        self.vars.with(|vars| vars.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Previously parsed program for this exact string instance.
    pub fn program(&self, source: &Str) -> Option<Program> {
        self.programs
            .with(|programs| programs.get(&source.identity()).map(|(_, p)| p.clone()))
    }

    pub fn insert_program(&self, source: Str, program: Program) {
        let _old = self
            .programs
            .with(|programs| programs.insert(source.identity(), (source, program)));
    }

    pub fn cached_programs(&self) -> usize {
        self.programs.with(|programs| programs.len())
    }
}

impl Default for Globals {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Globals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Globals")
            .field("vars", &self.len())
            .field("programs", &self.cached_programs())
            .finish()
    }
}
