//! Character built-ins (spec §4.5).

use super::{arity_error, type_error};
use crate::value::Value;

pub fn char_at(args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("অক্ষর_অবস্থানে", 2, args.len());
    }
    let s = match &args[0] {
        Value::Str(s) => s,
        other => return type_error("অক্ষর_অবস্থানে", "string", other),
    };
    let i = match &args[1] {
        Value::Integer(i) => *i,
        other => return type_error("অক্ষর_অবস্থানে", "integer", other),
    };
    if i < 0 {
        return Value::Null;
    }
    // Out-of-range indexing returns Null rather than an error, matching
    // the `Index` opcode's array/hash convention (spec §4.4).
    match s.chars().nth(i as usize) {
        Some(c) => Value::string(c.to_string()),
        None => Value::Null,
    }
}

pub fn code_of(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("কোড", 1, args.len());
    }
    match &args[0] {
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Integer(c as i64),
                _ => Value::Error("কোড: expected a single character".to_string()),
            }
        }
        other => type_error("কোড", "string", other),
    }
}

pub fn from_code(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("কোড_থেকে", 1, args.len());
    }
    let code = match &args[0] {
        Value::Integer(n) => *n,
        other => return type_error("কোড_থেকে", "integer", other),
    };
    if !(0..=0x10FFFF).contains(&code) {
        return Value::Error(format!("কোড_থেকে: {code} is out of Unicode code point range"));
    }
    match char::from_u32(code as u32) {
        Some(c) => Value::string(c.to_string()),
        None => Value::Error(format!("কোড_থেকে: {code} is not a valid code point")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_at_out_of_range_is_null() {
        assert_eq!(char_at(&[Value::string("hi"), Value::Integer(5)]), Value::Null);
    }

    #[test]
    fn code_of_and_from_code_round_trip() {
        let code = code_of(&[Value::string("A")]);
        assert_eq!(code, Value::Integer(65));
        assert_eq!(from_code(&[code]), Value::string("A"));
    }

    #[test]
    fn from_code_rejects_out_of_range() {
        assert!(from_code(&[Value::Integer(0x110000)]).is_error());
    }
}
