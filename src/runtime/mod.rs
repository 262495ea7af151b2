//! Runtime module
//!
//! This module handles evaluation of Cinder programs.

pub mod builtins;
pub mod context;
pub mod interpreter;
pub mod value;

pub use builtins::{Builtin, BuiltinFn};
pub use context::{Context, RuntimeFunction};
pub use interpreter::Runtime;
pub use value::Value;
