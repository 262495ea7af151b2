//! Abstract Syntax Tree definitions
//!
//! Every node owns its children outright; the tree is built once by the
//! parser and only ever borrowed by the runtime.

use crate::error::SourceLocation;
use std::fmt;

/// Root AST node: the top-level nodes of one source unit, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub nodes: Vec<Expr>,
}

/// An ordered statement sequence, the body of `{ ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Expr>,
    pub location: SourceLocation,
}

/// Expression node
///
/// Statements are expressions too: each top-level statement parses to
/// exactly one node and evaluates to a value (often `Void`).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer or float literal
    NumberLiteral {
        value: Number,
        location: SourceLocation,
    },

    /// `true` / `false`
    BoolLiteral {
        value: bool,
        location: SourceLocation,
    },

    /// Variable reference
    Identifier {
        name: String,
        location: SourceLocation,
    },

    /// Prefix operation: -x
    UnaryOp {
        operator: UnaryOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },

    /// Binary operation
    BinaryOp {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        location: SourceLocation,
    },

    /// Assignment to an existing binding: x = 1
    Assignment {
        name: String,
        value: Box<Expr>,
        location: SourceLocation,
    },

    /// Variable declaration: var x = 1
    VarDecl {
        name: String,
        initializer: Box<Expr>,
        location: SourceLocation,
    },

    /// Function declaration: func f(a, b) { ... return a * b }
    FunctionDecl {
        name: String,
        params: Vec<String>,
        body: Block,
        /// Trailing `return` lifted out of the body; `None` returns Void
        ret: Option<Box<Expr>>,
        location: SourceLocation,
    },

    /// Call by name: f(1, 2)
    FunctionCall {
        callee: String,
        arguments: Vec<Expr>,
        location: SourceLocation,
    },

    /// Bare `{ ... }` statement
    Block(Block),

    /// if (cond) { ... } else { ... }
    If {
        condition: Box<Expr>,
        then_branch: Block,
        else_branch: Option<Block>,
        location: SourceLocation,
    },

    /// Early return from inside a function body
    Return {
        value: Box<Expr>,
        location: SourceLocation,
    },
}

/// Numeric literal payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    /// Binding strength for precedence climbing; higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            Self::Equal | Self::Less | Self::LessEqual | Self::Greater | Self::GreaterEqual => 1,
            Self::Add | Self::Subtract => 2,
            Self::Multiply | Self::Divide | Self::Modulo => 3,
            Self::Power => 4,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Power => "^",
            Self::Equal => "==",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
}

impl Expr {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Expr::NumberLiteral { location, .. }
            | Expr::BoolLiteral { location, .. }
            | Expr::Identifier { location, .. }
            | Expr::UnaryOp { location, .. }
            | Expr::BinaryOp { location, .. }
            | Expr::Assignment { location, .. }
            | Expr::VarDecl { location, .. }
            | Expr::FunctionDecl { location, .. }
            | Expr::FunctionCall { location, .. }
            | Expr::If { location, .. }
            | Expr::Return { location, .. } => location,
            Expr::Block(block) => &block.location,
        }
    }
}
