//! Builtin function table
//!
//! The table is built once when a `Runtime` is created and never changes
//! afterwards. A builtin receives the runtime and the evaluated arguments.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::error::{CinderError, CinderResult};
use super::interpreter::Runtime;
use super::value::Value;

/// Native implementation of a builtin
pub type BuiltinFn = fn(&mut Runtime, &[Value]) -> CinderResult<Value>;

/// A builtin function record
///
/// Only [`Builtin::invoke`] runs the native function, so the argument
/// count is always checked first.
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    /// `None` accepts any number of arguments
    arity: Option<usize>,
    func: BuiltinFn,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    /// Check the argument count, then run the native implementation
    pub fn invoke(&self, runtime: &mut Runtime, args: &[Value]) -> CinderResult<Value> {
        if let Some(arity) = self.arity {
            if args.len() != arity {
                return Err(CinderError::arity_error(self.name, arity, args.len()));
            }
        }
        (self.func)(runtime, args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin fn {}>", self.name)
    }
}

/// Build the builtin table
pub fn table() -> HashMap<&'static str, Builtin> {
    let builtins = [
        Builtin { name: "print", arity: None, func: print },
        Builtin { name: "abs", arity: Some(1), func: abs },
        Builtin { name: "min", arity: Some(2), func: min },
        Builtin { name: "max", arity: Some(2), func: max },
        Builtin { name: "int", arity: Some(1), func: int },
        Builtin { name: "float", arity: Some(1), func: float },
    ];

    builtins.into_iter().map(|b| (b.name, b)).collect()
}

fn print(runtime: &mut Runtime, args: &[Value]) -> CinderResult<Value> {
    let line = args
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    runtime.emit(line);
    Ok(Value::Void)
}

fn abs(_: &mut Runtime, args: &[Value]) -> CinderResult<Value> {
    match args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| CinderError::arithmetic_error(format!("integer overflow in abs({})", n))),
        Value::Float(x) => Ok(Value::Float(x.abs())),
        other => Err(expects_number("abs", other)),
    }
}

fn min(_: &mut Runtime, args: &[Value]) -> CinderResult<Value> {
    pick("min", args[0], args[1], Ordering::Greater)
}

fn max(_: &mut Runtime, args: &[Value]) -> CinderResult<Value> {
    pick("max", args[0], args[1], Ordering::Less)
}

/// Keep `a` unless it compares to `b` as `replace_when`; mixed input yields a Float
fn pick(name: &str, a: Value, b: Value, replace_when: Ordering) -> CinderResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            Ok(Value::Int(if x.cmp(&y) == replace_when { y } else { x }))
        }
        _ => {
            let x = a.as_f64().ok_or_else(|| expects_number(name, a))?;
            let y = b.as_f64().ok_or_else(|| expects_number(name, b))?;
            Ok(Value::Float(if x.partial_cmp(&y) == Some(replace_when) { y } else { x }))
        }
    }
}

fn int(_: &mut Runtime, args: &[Value]) -> CinderResult<Value> {
    match args[0] {
        Value::Int(n) => Ok(Value::Int(n)),
        // `as` saturates, so range-check first
        Value::Float(x) if x.trunc() >= i64::MIN as f64 && x.trunc() < i64::MAX as f64 => {
            Ok(Value::Int(x.trunc() as i64))
        }
        Value::Float(x) => Err(CinderError::arithmetic_error(format!(
            "{:?} is out of range for int",
            x
        ))),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Void => Err(expects_number("int", Value::Void)),
    }
}

fn float(_: &mut Runtime, args: &[Value]) -> CinderResult<Value> {
    match args[0] {
        Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        other => other
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| expects_number("float", other)),
    }
}

fn expects_number(name: &str, got: Value) -> CinderError {
    CinderError::type_error(format!("{} expects a number, got {}", name, got.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> CinderResult<Value> {
        let mut runtime = Runtime::captured();
        let builtin = table()[name];
        builtin.invoke(&mut runtime, args)
    }

    #[test]
    fn test_table_contents() {
        let mut names: Vec<&str> = table().keys().copied().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["abs", "float", "int", "max", "min", "print"]);
    }

    #[test]
    fn test_print_records_output() {
        let mut runtime = Runtime::captured();
        let print = table()["print"];

        let result = print
            .invoke(&mut runtime, &[Value::Int(1), Value::Float(2.5), Value::Bool(true)])
            .unwrap();
        print.invoke(&mut runtime, &[]).unwrap();

        assert_eq!(result, Value::Void);
        assert_eq!(runtime.output(), &["1 2.5 true".to_string(), String::new()]);
    }

    #[test]
    fn test_abs() {
        assert_eq!(call("abs", &[Value::Int(-4)]).unwrap(), Value::Int(4));
        assert_eq!(call("abs", &[Value::Float(-0.5)]).unwrap(), Value::Float(0.5));
        assert!(matches!(
            call("abs", &[Value::Int(i64::MIN)]),
            Err(CinderError::ArithmeticError { .. })
        ));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(call("min", &[Value::Int(3), Value::Int(-1)]).unwrap(), Value::Int(-1));
        assert_eq!(call("max", &[Value::Int(3), Value::Int(-1)]).unwrap(), Value::Int(3));
        assert_eq!(call("max", &[Value::Int(1), Value::Float(1.5)]).unwrap(), Value::Float(1.5));
        assert!(matches!(
            call("min", &[Value::Bool(true), Value::Int(1)]),
            Err(CinderError::TypeError { .. })
        ));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call("int", &[Value::Float(-2.7)]).unwrap(), Value::Int(-2));
        assert_eq!(call("int", &[Value::Bool(true)]).unwrap(), Value::Int(1));
        assert_eq!(call("float", &[Value::Int(3)]).unwrap(), Value::Float(3.0));
        assert_eq!(call("float", &[Value::Bool(false)]).unwrap(), Value::Float(0.0));
        assert!(matches!(
            call("int", &[Value::Float(1e300)]),
            Err(CinderError::ArithmeticError { .. })
        ));
        assert!(matches!(call("float", &[Value::Void]), Err(CinderError::TypeError { .. })));
    }

    #[test]
    fn test_every_fixed_arity_builtin_rejects_no_arguments() {
        for builtin in table().values().filter(|b| b.arity().is_some()) {
            let mut runtime = Runtime::captured();
            assert!(matches!(
                builtin.invoke(&mut runtime, &[]),
                Err(CinderError::ArityError { .. })
            ));
        }
        assert_eq!(table()["min"].arity(), Some(2));
        assert_eq!(table()["print"].name(), "print");
    }

    #[test]
    fn test_fixed_arity_is_checked() {
        match call("abs", &[]) {
            Err(CinderError::ArityError { name, expected, found, .. }) => {
                assert_eq!(name, "abs");
                assert_eq!(expected, 1);
                assert_eq!(found, 0);
            }
            other => panic!("expected arity error, got {:?}", other),
        }
    }
}
