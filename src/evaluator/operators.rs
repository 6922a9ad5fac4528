use std::cmp::Ordering;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    ast::{BinOp, UnaryOp},
    value::Value,
};

pub fn apply_unary(op: UnaryOp, operand: &Value) -> Value {
    match op {
        UnaryOp::Plus => operand.clone(),
        UnaryOp::Minus => match operand.to_numeric() {
            Value::Integer(n) => n
                .checked_neg()
                .map_or(Value::Float(-(n as f64)), Value::Integer),
            other => Value::Float(-other.as_float().unwrap_or(f64::NAN)),
        },
        UnaryOp::Not => Value::Boolean(!operand.is_truthy()),
    }
}

/// Applies an eager binary operator to two evaluated operands.
///
/// Assignment and the short-circuiting operators never reach this point; the
/// evaluator handles them before evaluating the right side.
pub fn apply_binary(op: BinOp, left: &Value, right: &Value) -> Value {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Modulo => {
            arithmetic(op, &left.to_numeric(), &right.to_numeric())
        }
        BinOp::Equal => Value::Boolean(loose_equals(left, right)),
        BinOp::NotEqual => Value::Boolean(!loose_equals(left, right)),
        BinOp::StrictEqual => Value::Boolean(strict_equals(left, right)),
        BinOp::StrictNotEqual => Value::Boolean(!strict_equals(left, right)),
        BinOp::GreaterThan => ordered(left, right, |o| o == Ordering::Greater),
        BinOp::LessThan => ordered(left, right, |o| o == Ordering::Less),
        BinOp::GreaterEqual => ordered(left, right, |o| o != Ordering::Less),
        BinOp::LessEqual => ordered(left, right, |o| o != Ordering::Greater),
        // Lazy operators evaluated eagerly still get their value semantics
        BinOp::And => if left.is_truthy() { right.clone() } else { left.clone() },
        BinOp::Or => if left.is_truthy() { left.clone() } else { right.clone() },
        BinOp::NullCoalesce => if left.is_nullish() { right.clone() } else { left.clone() },
        BinOp::Assign => right.clone(),
    }
}

fn concatenates(v: &Value) -> bool {
    matches!(
        v,
        Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_)
    )
}

fn add(left: &Value, right: &Value) -> Value {
    if concatenates(left) || concatenates(right) {
        return Value::String(format!("{}{}", left.as_string(), right.as_string()));
    }
    arithmetic(BinOp::Add, &left.to_numeric(), &right.to_numeric())
}

/// Arithmetic on two numeric values.
///
/// Integer pairs stay integral while the result is exact and in range. Mixed
/// pairs go through [`Decimal`] so that `0.1 + 2` is `2.1`, and collapse back to
/// an integer when the result is whole.
fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        (Value::Integer(a), Value::Float(b)) => {
            decimal_arithmetic(op, Decimal::from_i64(*a), Decimal::from_f64(*b))
                .unwrap_or_else(|| float_arithmetic(op, *a as f64, *b))
        }
        (Value::Float(a), Value::Integer(b)) => {
            decimal_arithmetic(op, Decimal::from_f64(*a), Decimal::from_i64(*b))
                .unwrap_or_else(|| float_arithmetic(op, *a, *b as f64))
        }
        (a, b) => float_arithmetic(
            op,
            a.as_float().unwrap_or(f64::NAN),
            b.as_float().unwrap_or(f64::NAN),
        ),
    }
}

fn integer_arithmetic(op: BinOp, a: i64, b: i64) -> Value {
    let exact = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        BinOp::Divide if a.checked_rem(b) == Some(0) => a.checked_div(b),
        BinOp::Modulo => a.checked_rem(b),
        _ => None,
    };
    exact.map_or_else(|| float_arithmetic(op, a as f64, b as f64), Value::Integer)
}

fn decimal_arithmetic(op: BinOp, a: Option<Decimal>, b: Option<Decimal>) -> Option<Value> {
    let (a, b) = (a?, b?);
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Subtract => a.checked_sub(b),
        BinOp::Multiply => a.checked_mul(b),
        BinOp::Divide => a.checked_div(b),
        BinOp::Modulo => a.checked_rem(b),
        _ => None,
    }?;
    if result.is_integer()
        && let Some(n) = result.to_i64()
    {
        return Some(Value::Integer(n));
    }
    result.to_f64().map(Value::Float)
}

fn float_arithmetic(op: BinOp, a: f64, b: f64) -> Value {
    Value::Float(match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide => a / b,
        BinOp::Modulo => a % b,
        _ => f64::NAN,
    })
}

/// `===`: no coercion, identity for arrays, objects and functions.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            left.as_float() == right.as_float()
        }
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => std::rc::Rc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => std::rc::Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
        _ => false,
    }
}

/// `==`: JavaScript abstract equality.
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    use Value::*;
    match (left, right) {
        (Undefined | Null, Undefined | Null) => true,
        (Undefined | Null, _) | (_, Undefined | Null) => false,
        (Boolean(_), _) if !matches!(right, Boolean(_)) => {
            loose_equals(&left.to_numeric(), right)
        }
        (_, Boolean(_)) if !matches!(left, Boolean(_)) => {
            loose_equals(left, &right.to_numeric())
        }
        (Integer(_) | Float(_), String(_)) | (String(_), Integer(_) | Float(_)) => {
            strict_equals(&left.to_numeric(), &right.to_numeric())
        }
        (Array(_) | Object(_) | Function(_), Integer(_) | Float(_) | String(_)) => {
            loose_equals(&String(left.as_string()), right)
        }
        (Integer(_) | Float(_) | String(_), Array(_) | Object(_) | Function(_)) => {
            loose_equals(left, &String(right.as_string()))
        }
        _ => strict_equals(left, right),
    }
}

/// SameValueZero, as used by `includes`: strict equality where NaN equals NaN.
pub fn same_value_zero(left: &Value, right: &Value) -> bool {
    let is_nan = |v: &Value| matches!(v, Value::Float(n) if n.is_nan());
    strict_equals(left, right) || (is_nan(left) && is_nan(right))
}

/// Relational comparison. Two strings compare lexicographically, anything
/// else numerically; `None` when either side is NaN.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (left.to_numeric(), right.to_numeric()) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_float()?.partial_cmp(&b.as_float()?),
        },
    }
}

fn ordered(left: &Value, right: &Value, test: impl Fn(Ordering) -> bool) -> Value {
    Value::Boolean(compare(left, right).is_some_and(test))
}
