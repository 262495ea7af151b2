//! Parser module
//!
//! This module handles parsing tokens into an Abstract Syntax Tree (AST).

pub mod ast;
pub mod parser;

pub use ast::{Ast, BinaryOp, Block, Expr, Number, UnaryOp};
pub use parser::Parser;
