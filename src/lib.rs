//! # Cinder Programming Language
//!
//! A small imperative toy language with:
//! - integer, float and boolean values
//! - variables, user-defined functions and a handful of builtins
//! - arithmetic and comparison operators with precedence
//! - `if`/`else` with block-scoped locals
//!
//! ## Architecture
//!
//! - `lexer`: Tokenization of source code
//! - `parser`: Parsing tokens into an Abstract Syntax Tree (AST)
//! - `runtime`: Tree-walking evaluator over a stack of scopes
//! - `error`: Error handling and diagnostics

pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;

// Re-export commonly used types
pub use error::{CinderError, CinderResult, Diagnostic, SourceLocation};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{Ast, Expr, Parser};
pub use runtime::{Runtime, Value};

/// Version of the Cinder language
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse and run a Cinder program on a fresh runtime
///
/// # Arguments
///
/// * `source` - The source code to run
/// * `filename` - Optional filename for error reporting
///
/// # Returns
///
/// The value of the last top-level statement, or the first error.
pub fn run(source: &str, filename: Option<&str>) -> CinderResult<Value> {
    let mut runtime = Runtime::new();
    run_in(&mut runtime, source, filename)
}

/// Parse `source` and evaluate it against an existing runtime
///
/// Declarations made by earlier calls stay visible, which is what the REPL
/// relies on.
pub fn run_in(runtime: &mut Runtime, source: &str, filename: Option<&str>) -> CinderResult<Value> {
    let ast = Parser::from_source(source, filename)?.parse()?;
    runtime.execute(&ast)
}
