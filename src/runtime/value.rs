//! Runtime value representation
//!
//! Values are plain copies with no identity. Every operator matches both
//! operands exhaustively; mixing an Int with a Float promotes the Int.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{CinderError, CinderResult};
use crate::parser::{BinaryOp, Number};

/// Runtime value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Void,
}

/// Two numeric operands after promotion
#[derive(Debug, Clone, Copy)]
enum Operands {
    Ints(i64, i64),
    Floats(f64, f64),
}

impl Operands {
    fn of(left: Value, op: BinaryOp, right: Value) -> CinderResult<Self> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Self::Ints(a, b)),
            (Value::Int(a), Value::Float(b)) => Ok(Self::Floats(a as f64, b)),
            (Value::Float(a), Value::Int(b)) => Ok(Self::Floats(a, b as f64)),
            (Value::Float(a), Value::Float(b)) => Ok(Self::Floats(a, b)),
            (a, b) => Err(CinderError::type_error(format!(
                "cannot apply '{}' to {} and {}",
                op,
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    fn divisor_is_zero(self) -> bool {
        match self {
            Self::Ints(_, b) => b == 0,
            Self::Floats(_, b) => b == 0.0,
        }
    }

    fn ordering(self) -> Ordering {
        match self {
            Self::Ints(a, b) => a.cmp(&b),
            // Floats are always finite here, so partial_cmp never fails
            Self::Floats(a, b) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }
}

impl Value {
    /// Truthiness used by conditionals
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Void => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Void => "void",
        }
    }

    /// Apply a binary operator
    pub fn binary(self, op: BinaryOp, rhs: Value) -> CinderResult<Value> {
        if let (BinaryOp::Equal, Value::Bool(a), Value::Bool(b)) = (op, self, rhs) {
            return Ok(Value::Bool(a == b));
        }

        let operands = Operands::of(self, op, rhs)?;
        match op {
            BinaryOp::Add => arithmetic(op, operands, i64::checked_add, |a, b| a + b),
            BinaryOp::Subtract => arithmetic(op, operands, i64::checked_sub, |a, b| a - b),
            BinaryOp::Multiply => arithmetic(op, operands, i64::checked_mul, |a, b| a * b),
            BinaryOp::Divide => {
                if operands.divisor_is_zero() {
                    return Err(CinderError::arithmetic_error("division by zero"));
                }
                arithmetic(op, operands, i64::checked_div, |a, b| a / b)
            }
            BinaryOp::Modulo => {
                if operands.divisor_is_zero() {
                    return Err(CinderError::arithmetic_error("modulo by zero"));
                }
                arithmetic(op, operands, i64::checked_rem, |a, b| a % b)
            }
            BinaryOp::Power => power(operands),
            BinaryOp::Equal => Ok(Value::Bool(operands.ordering() == Ordering::Equal)),
            BinaryOp::Less => Ok(Value::Bool(operands.ordering() == Ordering::Less)),
            BinaryOp::LessEqual => Ok(Value::Bool(operands.ordering() != Ordering::Greater)),
            BinaryOp::Greater => Ok(Value::Bool(operands.ordering() == Ordering::Greater)),
            BinaryOp::GreaterEqual => Ok(Value::Bool(operands.ordering() != Ordering::Less)),
        }
    }

    /// Unary minus
    pub fn negate(self) -> CinderResult<Value> {
        match self {
            Value::Int(n) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| CinderError::arithmetic_error(format!("integer overflow in -({})", n))),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(CinderError::type_error(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            Value::Bool(_) | Value::Void => None,
        }
    }
}

fn arithmetic(
    op: BinaryOp,
    operands: Operands,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> CinderResult<Value> {
    match operands {
        Operands::Ints(a, b) => int_op(a, b).map(Value::Int).ok_or_else(|| {
            CinderError::arithmetic_error(format!("integer overflow in {} {} {}", a, op, b))
        }),
        Operands::Floats(a, b) => finite(op, a, b, float_op(a, b)),
    }
}

/// `^`: checked integer power for a non-negative Int exponent, `powf` otherwise
fn power(operands: Operands) -> CinderResult<Value> {
    match operands {
        Operands::Ints(base, exp) if exp >= 0 => u32::try_from(exp)
            .ok()
            .and_then(|exp| base.checked_pow(exp))
            .map(Value::Int)
            .ok_or_else(|| {
                CinderError::arithmetic_error(format!("integer overflow in {} ^ {}", base, exp))
            }),
        Operands::Ints(base, exp) => {
            let (base, exp) = (base as f64, exp as f64);
            finite(BinaryOp::Power, base, exp, base.powf(exp))
        }
        Operands::Floats(base, exp) => finite(BinaryOp::Power, base, exp, base.powf(exp)),
    }
}

fn finite(op: BinaryOp, a: f64, b: f64, result: f64) -> CinderResult<Value> {
    if result.is_finite() {
        Ok(Value::Float(result))
    } else {
        Err(CinderError::arithmetic_error(format!(
            "{:?} {} {:?} is not a finite number",
            a, op, b
        )))
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(n) => Value::Int(n),
            Number::Float(x) => Value::Float(x),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(left: Value, op: BinaryOp, right: Value) -> CinderResult<Value> {
        left.binary(op, right)
    }

    fn arithmetic_message(result: CinderResult<Value>) -> String {
        match result {
            Err(CinderError::ArithmeticError { message, .. }) => message,
            other => panic!("expected arithmetic error, got {:?}", other),
        }
    }

    #[test]
    fn test_int_arithmetic_stays_int() {
        assert_eq!(eval(Value::Int(7), BinaryOp::Add, Value::Int(5)).unwrap(), Value::Int(12));
        assert_eq!(eval(Value::Int(7), BinaryOp::Subtract, Value::Int(9)).unwrap(), Value::Int(-2));
        assert_eq!(eval(Value::Int(7), BinaryOp::Multiply, Value::Int(3)).unwrap(), Value::Int(21));
        assert_eq!(eval(Value::Int(7), BinaryOp::Divide, Value::Int(2)).unwrap(), Value::Int(3));
        assert_eq!(eval(Value::Int(-7), BinaryOp::Divide, Value::Int(2)).unwrap(), Value::Int(-3));
        assert_eq!(eval(Value::Int(26), BinaryOp::Modulo, Value::Int(-21)).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_mixed_arithmetic_promotes_to_float() {
        assert_eq!(eval(Value::Int(1), BinaryOp::Add, Value::Float(0.5)).unwrap(), Value::Float(1.5));
        assert_eq!(eval(Value::Float(7.0), BinaryOp::Divide, Value::Int(2)).unwrap(), Value::Float(3.5));
        assert_eq!(eval(Value::Float(7.5), BinaryOp::Modulo, Value::Int(2)).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn test_power() {
        assert_eq!(eval(Value::Int(2), BinaryOp::Power, Value::Int(10)).unwrap(), Value::Int(1024));
        assert_eq!(eval(Value::Int(5), BinaryOp::Power, Value::Int(0)).unwrap(), Value::Int(1));
        assert_eq!(eval(Value::Int(2), BinaryOp::Power, Value::Int(-1)).unwrap(), Value::Float(0.5));
        assert_eq!(eval(Value::Float(1.5), BinaryOp::Power, Value::Int(2)).unwrap(), Value::Float(2.25));
        assert_eq!(eval(Value::Int(4), BinaryOp::Power, Value::Float(2.0)).unwrap(), Value::Float(16.0));
    }

    #[test]
    fn test_power_overflow_and_non_finite() {
        let message = arithmetic_message(eval(Value::Int(10), BinaryOp::Power, Value::Int(40)));
        assert!(message.contains("overflow"));

        let message = arithmetic_message(eval(Value::Int(0), BinaryOp::Power, Value::Int(-1)));
        assert!(message.contains("not a finite number"));

        let message = arithmetic_message(eval(Value::Float(-8.0), BinaryOp::Power, Value::Float(0.5)));
        assert!(message.contains("not a finite number"));
    }

    #[test]
    fn test_division_and_modulo_by_zero() {
        assert_eq!(
            arithmetic_message(eval(Value::Int(1), BinaryOp::Divide, Value::Int(0))),
            "division by zero"
        );
        assert_eq!(
            arithmetic_message(eval(Value::Float(1.0), BinaryOp::Divide, Value::Float(0.0))),
            "division by zero"
        );
        assert_eq!(
            arithmetic_message(eval(Value::Int(1), BinaryOp::Modulo, Value::Int(0))),
            "modulo by zero"
        );
        assert_eq!(
            arithmetic_message(eval(Value::Float(2.5), BinaryOp::Modulo, Value::Int(0))),
            "modulo by zero"
        );
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        let message = arithmetic_message(eval(Value::Int(i64::MAX), BinaryOp::Add, Value::Int(1)));
        assert!(message.contains("integer overflow"));
        arithmetic_message(eval(Value::Int(i64::MIN), BinaryOp::Divide, Value::Int(-1)));
        arithmetic_message(Value::Int(i64::MIN).negate());
    }

    #[test]
    fn test_float_overflow_is_an_error() {
        let message = arithmetic_message(eval(Value::Float(f64::MAX), BinaryOp::Multiply, Value::Int(10)));
        assert!(message.contains("not a finite number"));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval(Value::Int(4), BinaryOp::Greater, Value::Int(3)).unwrap(), Value::Bool(true));
        assert_eq!(eval(Value::Int(3), BinaryOp::GreaterEqual, Value::Int(3)).unwrap(), Value::Bool(true));
        assert_eq!(eval(Value::Int(3), BinaryOp::Less, Value::Int(3)).unwrap(), Value::Bool(false));
        assert_eq!(eval(Value::Float(2.5), BinaryOp::LessEqual, Value::Int(3)).unwrap(), Value::Bool(true));
        assert_eq!(eval(Value::Int(2), BinaryOp::Equal, Value::Float(2.0)).unwrap(), Value::Bool(true));
        assert_eq!(eval(Value::Bool(true), BinaryOp::Equal, Value::Bool(false)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_incompatible_kinds_are_type_errors() {
        for (left, op, right) in [
            (Value::Bool(true), BinaryOp::Add, Value::Bool(true)),
            (Value::Int(1), BinaryOp::Multiply, Value::Void),
            (Value::Bool(false), BinaryOp::Less, Value::Bool(true)),
            (Value::Bool(true), BinaryOp::Equal, Value::Int(1)),
        ] {
            match eval(left, op, right) {
                Err(CinderError::TypeError { message, .. }) => {
                    assert!(message.starts_with("cannot apply"), "{}", message)
                }
                other => panic!("expected type error, got {:?}", other),
            }
        }

        assert!(matches!(Value::Bool(true).negate(), Err(CinderError::TypeError { .. })));
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int(-3).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Float(0.1).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Void.is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Void.to_string(), "void");
    }
}
