//! Interpreter implementation
//!
//! `Runtime` walks the AST over an indexed stack of [`Context`]s. The stack
//! mirrors lexical nesting: the global scope sits at index 0 and is never
//! popped; every `{ }` scope and every call pushes one context and pops it
//! again on the way out, whether the body finished, returned early or failed.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{CinderError, CinderResult};
use crate::parser::{Ast, Block, Expr, UnaryOp};
use super::builtins::{self, Builtin};
use super::context::{Context, RuntimeFunction};
use super::value::Value;

/// Control flow signals
#[derive(Debug, Clone, Copy, PartialEq)]
enum ControlFlow {
    None,
    Return(Value),
}

/// A resolved call target
enum Callee {
    User(Rc<RuntimeFunction>),
    Builtin(Builtin),
}

/// Tree-walking evaluator
///
/// One instance per program execution. Names are resolved by walking the
/// context stack from the innermost scope outward; user-defined functions
/// shadow builtins of the same name.
pub struct Runtime {
    contexts: Vec<Context>,
    builtins: HashMap<&'static str, Builtin>,
    control_flow: ControlFlow,
    output: Vec<String>,
    echo: bool,
}

impl Runtime {
    /// Create a runtime with the global context pushed; `print` writes to stdout
    pub fn new() -> Self {
        Self::with_echo(true)
    }

    /// Create a runtime whose `print` output is only recorded, see [`Runtime::output`]
    pub fn captured() -> Self {
        Self::with_echo(false)
    }

    fn with_echo(echo: bool) -> Self {
        Self {
            contexts: vec![Context::new()],
            builtins: builtins::table(),
            control_flow: ControlFlow::None,
            output: Vec::new(),
            echo,
        }
    }

    /// Lines printed so far, in order
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub(crate) fn emit(&mut self, line: String) {
        if self.echo {
            println!("{}", line);
        }
        self.output.push(line);
    }

    /// Number of contexts on the stack; 1 at top level
    pub fn depth(&self) -> usize {
        self.contexts.len()
    }

    // ===== Entry points =====

    /// Evaluate every top-level node in order, returning the last value
    pub fn execute(&mut self, ast: &Ast) -> CinderResult<Value> {
        self.control_flow = ControlFlow::None;
        let mut last = Value::Void;

        for node in &ast.nodes {
            last = self.evaluate(node)?;

            if let ControlFlow::Return(value) = self.take_control_flow() {
                last = value;
                break;
            }
        }

        Ok(last)
    }

    /// Evaluate one node
    ///
    /// Errors raised without a position get this node's location.
    pub fn evaluate(&mut self, expr: &Expr) -> CinderResult<Value> {
        self.eval_expr(expr).map_err(|e| e.or_at(expr.location()))
    }

    fn eval_expr(&mut self, expr: &Expr) -> CinderResult<Value> {
        match expr {
            Expr::NumberLiteral { value, .. } => Ok(Value::from(*value)),

            Expr::BoolLiteral { value, .. } => Ok(Value::Bool(*value)),

            Expr::Identifier { name, .. } => self.get_variable(name),

            Expr::UnaryOp {
                operator: UnaryOp::Negate,
                operand,
                ..
            } => self.evaluate(operand)?.negate(),

            Expr::BinaryOp {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                left.binary(*operator, right)
            }

            Expr::Assignment { name, value, .. } => {
                let value = self.evaluate(value)?;
                self.assign_variable(name, value)?;
                Ok(value)
            }

            Expr::VarDecl {
                name, initializer, ..
            } => {
                let value = self.evaluate(initializer)?;
                self.create_variable(name.clone(), value);
                Ok(value)
            }

            Expr::FunctionDecl {
                name,
                params,
                body,
                ret,
                ..
            } => {
                debug!(function = %name, arity = params.len(), depth = self.depth(), "declaring function");
                self.create_function(RuntimeFunction {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    ret: ret.as_deref().cloned(),
                });
                Ok(Value::Void)
            }

            Expr::FunctionCall {
                callee, arguments, ..
            } => self.call(callee, arguments),

            Expr::Block(block) => {
                self.with_context(|runtime| runtime.run_block(block))?;
                Ok(Value::Void)
            }

            Expr::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let branch = if self.evaluate(condition)?.is_truthy() {
                    Some(then_branch)
                } else {
                    else_branch.as_ref()
                };

                if let Some(block) = branch {
                    self.with_context(|runtime| runtime.run_block(block))?;
                }
                Ok(Value::Void)
            }

            Expr::Return { value, .. } => {
                let value = self.evaluate(value)?;
                self.control_flow = ControlFlow::Return(value);
                Ok(value)
            }
        }
    }

    /// Run statements in order, stopping early once a `return` has fired
    fn run_block(&mut self, block: &Block) -> CinderResult<()> {
        for statement in &block.statements {
            self.evaluate(statement)?;
            if self.is_returning() {
                break;
            }
        }
        Ok(())
    }

    // ===== Calls =====

    fn call(&mut self, callee: &str, arguments: &[Expr]) -> CinderResult<Value> {
        let target = match (self.find_function(callee), self.get_builtin(callee)) {
            (Some(function), _) => Callee::User(function),
            (None, Some(builtin)) => Callee::Builtin(builtin),
            (None, None) => return Err(CinderError::unresolved_name(callee)),
        };

        // Arguments are evaluated in the caller's scope and passed by value
        let args = arguments
            .iter()
            .map(|argument| self.evaluate(argument))
            .collect::<CinderResult<Vec<_>>>()?;

        match target {
            Callee::User(function) => self.call_function(&function, args),
            Callee::Builtin(builtin) => {
                debug!(builtin = builtin.name(), args = args.len(), "calling builtin");
                builtin.invoke(self, &args)
            }
        }
    }

    /// Invoke a user-defined function with already evaluated arguments
    pub fn call_function(
        &mut self,
        function: &RuntimeFunction,
        args: Vec<Value>,
    ) -> CinderResult<Value> {
        if args.len() != function.arity() {
            return Err(CinderError::arity_error(
                &function.name,
                function.arity(),
                args.len(),
            ));
        }

        debug!(function = %function.name, args = args.len(), depth = self.depth(), "calling function");

        self.with_context(|runtime| {
            runtime.create_variables(&function.params, args)?;
            runtime.run_block(&function.body)?;

            if let ControlFlow::Return(value) = runtime.take_control_flow() {
                return Ok(value);
            }

            match &function.ret {
                Some(ret) => runtime.evaluate(ret),
                None => Ok(Value::Void),
            }
        })
    }

    fn is_returning(&self) -> bool {
        matches!(self.control_flow, ControlFlow::Return(_))
    }

    fn take_control_flow(&mut self) -> ControlFlow {
        std::mem::replace(&mut self.control_flow, ControlFlow::None)
    }

    // ===== Context stack =====

    /// Push a fresh innermost context
    pub fn push_context(&mut self) {
        self.contexts.push(Context::new());
        trace!(depth = self.depth(), "pushed context");
    }

    /// Pop the innermost context; the global context is never popped
    pub fn pop_context(&mut self) -> Option<Context> {
        if self.contexts.len() <= 1 {
            return None;
        }
        let context = self.contexts.pop();
        trace!(depth = self.depth(), "popped context");
        context
    }

    /// Run `f` inside a new context, popping it on every exit path
    fn with_context<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CinderResult<T>,
    ) -> CinderResult<T> {
        self.push_context();
        let result = f(self);
        self.pop_context();
        result
    }

    fn innermost(&mut self) -> &mut Context {
        // The global context at index 0 is never popped
        let top = self.contexts.len() - 1;
        &mut self.contexts[top]
    }

    // ===== Variables =====

    /// True if any scope on the stack binds `name`
    pub fn has_variable(&self, name: &str) -> bool {
        self.contexts.iter().any(|context| context.has_variable(name))
    }

    /// Resolve `name` innermost-first
    pub fn get_variable(&self, name: &str) -> CinderResult<Value> {
        self.contexts
            .iter()
            .rev()
            .find(|context| context.has_variable(name))
            .map_or_else(
                || Err(CinderError::unresolved_name(name)),
                |context| context.get_variable(name),
            )
    }

    /// Declare in the innermost scope
    pub fn create_variable(&mut self, name: impl Into<String>, value: Value) {
        self.innermost().create_variable(name, value);
    }

    /// Bind parameters in the innermost scope
    pub fn create_variables(&mut self, names: &[String], values: Vec<Value>) -> CinderResult<()> {
        self.innermost().create_variables(names, values)
    }

    /// Mutate an existing binding in the scope that owns it
    ///
    /// Assignment never declares: if no scope owns `name` this is an
    /// unresolved-name error.
    pub fn assign_variable(&mut self, name: &str, value: Value) -> CinderResult<()> {
        if self
            .contexts
            .iter_mut()
            .rev()
            .any(|context| context.set_variable(name, value))
        {
            Ok(())
        } else {
            Err(CinderError::unresolved_name(name))
        }
    }

    // ===== Functions =====

    fn find_function(&self, name: &str) -> Option<Rc<RuntimeFunction>> {
        self.contexts
            .iter()
            .rev()
            .find(|context| context.has_function(name))
            .and_then(|context| context.get_function(name).ok())
    }

    /// Resolve a user-defined function innermost-first
    pub fn get_function(&self, name: &str) -> CinderResult<Rc<RuntimeFunction>> {
        self.find_function(name)
            .ok_or_else(|| CinderError::unresolved_name(name))
    }

    /// Declare a function in the innermost scope
    pub fn create_function(&mut self, function: RuntimeFunction) {
        self.innermost().create_function(function);
    }

    pub fn get_builtin(&self, name: &str) -> Option<Builtin> {
        self.builtins.get(name).copied()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
