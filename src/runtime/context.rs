//! Lexical scopes
//!
//! A `Context` holds the variables and functions declared at one level of
//! nesting. The runtime keeps them on a stack; a `Context` itself knows
//! nothing about its neighbours.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{CinderError, CinderResult};
use crate::parser::{Block, Expr};
use super::value::Value;

/// A user-defined function, as captured from its declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub ret: Option<Expr>,
}

impl RuntimeFunction {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// One scope of name bindings
#[derive(Debug, Default)]
pub struct Context {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Rc<RuntimeFunction>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get_variable(&self, name: &str) -> CinderResult<Value> {
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| CinderError::unresolved_name(name))
    }

    /// Insert or overwrite a binding in this scope only
    pub fn create_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Bind `names[i]` to `values[i]` for every i
    ///
    /// Nothing is bound when the lengths differ.
    pub fn create_variables(&mut self, names: &[String], values: Vec<Value>) -> CinderResult<()> {
        if names.len() != values.len() {
            return Err(CinderError::arity_error(
                "parameter list",
                names.len(),
                values.len(),
            ));
        }

        for (name, value) in names.iter().zip(values) {
            self.variables.insert(name.clone(), value);
        }
        Ok(())
    }

    /// Overwrite an existing binding; returns false if this scope does not own `name`
    pub(crate) fn set_variable(&mut self, name: &str, value: Value) -> bool {
        match self.variables.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get_function(&self, name: &str) -> CinderResult<Rc<RuntimeFunction>> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| CinderError::unresolved_name(name))
    }

    /// Insert or replace a function in this scope
    pub fn create_function(&mut self, function: RuntimeFunction) {
        self.functions
            .insert(function.name.clone(), Rc::new(function));
    }
}
