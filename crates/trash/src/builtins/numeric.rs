//! Integer arithmetic, comparison chains, and extrema.
//!
//! All arithmetic is two's-complement 64-bit and wraps on overflow.
//! Division truncates toward zero; dividing by zero is a runtime error
//! rather than a wrap. Arguments arrive type-checked as numbers.

use crate::{
    error::{EvalError, EvalResult},
    value::Value,
};

fn int(value: Value) -> i64 {
    match value {
        Value::Int(n) => n,
        _ => unreachable!("argument types checked before dispatch"),
    }
}

/// `(+ n…)`: sum, `0` when empty.
pub(super) fn add(args: &[Value]) -> EvalResult<Value> {
    let sum = args.iter().fold(0i64, |acc, &arg| acc.wrapping_add(int(arg)));
    Ok(Value::Int(sum))
}

/// `(- n m…)`: fold subtraction from the first argument; a single argument
/// is returned unchanged.
pub(super) fn sub(args: &[Value]) -> EvalResult<Value> {
    let result = args[1..]
        .iter()
        .fold(int(args[0]), |acc, &arg| acc.wrapping_sub(int(arg)));
    Ok(Value::Int(result))
}

/// `(* n…)`: product, `1` when empty.
pub(super) fn mul(args: &[Value]) -> EvalResult<Value> {
    let product = args.iter().fold(1i64, |acc, &arg| acc.wrapping_mul(int(arg)));
    Ok(Value::Int(product))
}

/// `(/ n m…)`: fold truncating division from the first argument.
pub(super) fn div(args: &[Value]) -> EvalResult<Value> {
    let mut result = int(args[0]);
    for &arg in &args[1..] {
        let divisor = int(arg);
        if divisor == 0 {
            return Err(EvalError::runtime("division by zero"));
        }
        result = result.wrapping_div(divisor);
    }
    Ok(Value::Int(result))
}

/// Chained comparison: true iff every consecutive pair satisfies `relation`.
pub(super) fn compare(args: &[Value], relation: fn(i64, i64) -> bool) -> Value {
    let holds = args
        .windows(2)
        .all(|pair| relation(int(pair[0]), int(pair[1])));
    Value::Bool(holds)
}

/// `min`/`max` over at least one number.
pub(super) fn extremum(args: &[Value], pick: fn(i64, i64) -> i64) -> Value {
    let result = args[1..]
        .iter()
        .fold(int(args[0]), |acc, &arg| pick(acc, int(arg)));
    Value::Int(result)
}

/// `(abs n)`, wrapping at `i64::MIN` like the rest of the arithmetic.
pub(super) fn abs(args: &[Value]) -> Value {
    Value::Int(int(args[0]).wrapping_abs())
}
