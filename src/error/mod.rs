//! Error handling and diagnostics for the Cinder language
//!
//! This module provides the error taxonomy shared by the lexer, the parser
//! and the runtime, plus diagnostic formatting for the CLI.

use std::fmt;

pub mod diagnostic;

pub use diagnostic::Diagnostic;

/// Result type alias for Cinder operations
pub type CinderResult<T> = Result<T, CinderError>;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// Optional filename
    pub filename: Option<String>,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize, filename: Option<String>) -> Self {
        Self {
            line,
            column,
            filename,
        }
    }

    /// Create a source location without a filename
    pub fn at(line: usize, column: usize) -> Self {
        Self::new(line, column, None)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref filename) = self.filename {
            write!(f, "{}:{}:{}", filename, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Main error type for the Cinder language
///
/// Lexing and parsing errors always know where they happened. Evaluation
/// errors may be raised by a layer that has no source position (a scope
/// lookup, an operator on two values); the runtime fills the location in
/// from the node being evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum CinderError {
    /// Unexpected character or malformed literal
    LexerError {
        message: String,
        location: SourceLocation,
    },
    /// Malformed construct; parsing stops at the first one
    SyntaxError {
        message: String,
        location: SourceLocation,
    },
    /// Read, assignment or call of a name no scope defines
    UnresolvedName {
        name: String,
        location: Option<SourceLocation>,
    },
    /// Operator applied to incompatible value kinds
    TypeError {
        message: String,
        location: Option<SourceLocation>,
    },
    /// Division or modulo by zero, integer overflow
    ArithmeticError {
        message: String,
        location: Option<SourceLocation>,
    },
    /// Argument count does not match the callee's parameter list
    ArityError {
        name: String,
        expected: usize,
        found: usize,
        location: Option<SourceLocation>,
    },
}

impl CinderError {
    /// Create a new lexer error
    pub fn lexer_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::LexerError {
            message: message.into(),
            location,
        }
    }

    /// Create a new syntax error
    pub fn syntax_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::SyntaxError {
            message: message.into(),
            location,
        }
    }

    /// Create a new unresolved name error
    pub fn unresolved_name(name: impl Into<String>) -> Self {
        Self::UnresolvedName {
            name: name.into(),
            location: None,
        }
    }

    /// Create a new type error
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError {
            message: message.into(),
            location: None,
        }
    }

    /// Create a new arithmetic error
    pub fn arithmetic_error(message: impl Into<String>) -> Self {
        Self::ArithmeticError {
            message: message.into(),
            location: None,
        }
    }

    /// Create a new arity error
    pub fn arity_error(name: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::ArityError {
            name: name.into(),
            expected,
            found,
            location: None,
        }
    }

    /// Attach a location to an evaluation error that does not have one yet.
    ///
    /// Errors that already carry a location keep it, so the innermost
    /// position wins when an error propagates through nested nodes.
    pub fn or_at(mut self, at: &SourceLocation) -> Self {
        match &mut self {
            Self::UnresolvedName { location, .. }
            | Self::TypeError { location, .. }
            | Self::ArithmeticError { location, .. }
            | Self::ArityError { location, .. } => {
                if location.is_none() {
                    *location = Some(at.clone());
                }
            }
            Self::LexerError { .. } | Self::SyntaxError { .. } => {}
        }
        self
    }

    /// Get the error kind as a string
    pub fn kind(&self) -> &str {
        match self {
            Self::LexerError { .. } => "Lexer Error",
            Self::SyntaxError { .. } => "Syntax Error",
            Self::UnresolvedName { .. } => "Unresolved Name",
            Self::TypeError { .. } => "Type Error",
            Self::ArithmeticError { .. } => "Arithmetic Error",
            Self::ArityError { .. } => "Arity Error",
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::LexerError { message, .. }
            | Self::SyntaxError { message, .. }
            | Self::TypeError { message, .. }
            | Self::ArithmeticError { message, .. } => message.clone(),
            Self::UnresolvedName { name, .. } => format!("'{}' is not defined", name),
            Self::ArityError {
                name,
                expected,
                found,
                ..
            } => format!(
                "'{}' expects {} argument{} but got {}",
                name,
                expected,
                if *expected == 1 { "" } else { "s" },
                found
            ),
        }
    }

    /// Get the source location if available
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::LexerError { location, .. } | Self::SyntaxError { location, .. } => {
                Some(location)
            }
            Self::UnresolvedName { location, .. }
            | Self::TypeError { location, .. }
            | Self::ArithmeticError { location, .. }
            | Self::ArityError { location, .. } => location.as_ref(),
        }
    }
}

impl fmt::Display for CinderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = self.location() {
            write!(f, "{}: {} at {}", self.kind(), self.message(), location)
        } else {
            write!(f, "{}: {}", self.kind(), self.message())
        }
    }
}

impl std::error::Error for CinderError {}
