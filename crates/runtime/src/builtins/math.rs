//! Math built-ins (spec §4.5).
//!
//! The value model has no floating-point type (spec's integer-literal-only
//! lexer, SPEC_FULL §3 supplement), so every result here is an `Integer`.

use super::{arity_error, type_error};
use crate::value::Value;

fn as_int(name: &str, args: &[Value], index: usize) -> Result<i64, Value> {
    match &args[index] {
        Value::Integer(n) => Ok(*n),
        other => Err(type_error(name, "integer", other)),
    }
}

pub fn pow(args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("ঘাত", 2, args.len());
    }
    let base = match as_int("ঘাত", args, 0) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let exp = match as_int("ঘাত", args, 1) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if exp < 0 {
        return Value::Error("ঘাত: negative exponent is not supported".to_string());
    }
    Value::Integer(base.pow(exp as u32))
}

pub fn sqrt(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("বর্গমূল", 1, args.len());
    }
    let n = match as_int("বর্গমূল", args, 0) {
        Ok(n) => n,
        Err(e) => return e,
    };
    if n < 0 {
        return Value::Error("বর্গমূল: cannot take the square root of a negative number".to_string());
    }
    Value::Integer((n as f64).sqrt() as i64)
}

pub fn abs(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("পরম", 1, args.len());
    }
    match as_int("পরম", args, 0) {
        Ok(n) => Value::Integer(n.abs()),
        Err(e) => e,
    }
}

pub fn max(args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("সর্বোচ্চ", 2, args.len());
    }
    let a = match as_int("সর্বোচ্চ", args, 0) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let b = match as_int("সর্বোচ্চ", args, 1) {
        Ok(n) => n,
        Err(e) => return e,
    };
    Value::Integer(a.max(b))
}

pub fn min(args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("সর্বনিম্ন", 2, args.len());
    }
    let a = match as_int("সর্বনিম্ন", args, 0) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let b = match as_int("সর্বনিম্ন", args, 1) {
        Ok(n) => n,
        Err(e) => return e,
    };
    Value::Integer(a.min(b))
}

/// No-op on an already-integral value; kept for API parity with the
/// enumerated built-in set (spec §4.5) even though there is no float
/// input that would make rounding observable.
pub fn round(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("পূর্ণায়ন", 1, args.len());
    }
    match as_int("পূর্ণায়ন", args, 0) {
        Ok(n) => Value::Integer(n),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow_computes_integer_power() {
        assert_eq!(pow(&[Value::Integer(2), Value::Integer(10)]), Value::Integer(1024));
    }

    #[test]
    fn sqrt_errors_on_negative() {
        assert!(sqrt(&[Value::Integer(-1)]).is_error());
    }

    #[test]
    fn abs_and_minmax() {
        assert_eq!(abs(&[Value::Integer(-5)]), Value::Integer(5));
        assert_eq!(max(&[Value::Integer(3), Value::Integer(7)]), Value::Integer(7));
        assert_eq!(min(&[Value::Integer(3), Value::Integer(7)]), Value::Integer(3));
    }
}
