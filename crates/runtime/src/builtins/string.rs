//! String built-ins (spec §4.5).

use super::{arity_error, type_error};
use crate::value::Value;

fn as_str<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a str, Value> {
    match &args[index] {
        Value::Str(s) => Ok(s),
        other => Err(type_error(name, "string", other)),
    }
}

pub fn split(args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("ভাগ", 2, args.len());
    }
    let s = match as_str("ভাগ", args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let sep = match as_str("ভাগ", args, 1) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::string(c.to_string())).collect()
    } else {
        s.split(sep).map(Value::string).collect()
    };
    Value::array(parts)
}

pub fn join(args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("জোড়া", 2, args.len());
    }
    let sep = match as_str("জোড়া", args, 1) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match &args[0] {
        Value::Array(arr) => {
            let mut parts = Vec::with_capacity(arr.borrow().len());
            for item in arr.borrow().iter() {
                match item {
                    Value::Str(s) => parts.push(s.to_string()),
                    other => return type_error("জোড়া", "array of strings", other),
                }
            }
            Value::string(parts.join(sep))
        }
        other => type_error("জোড়া", "array", other),
    }
}

pub fn to_upper(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("বড়_হাতের", 1, args.len());
    }
    match as_str("বড়_হাতের", args, 0) {
        Ok(s) => Value::string(s.to_uppercase()),
        Err(e) => e,
    }
}

pub fn to_lower(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("ছোট_হাতের", 1, args.len());
    }
    match as_str("ছোট_হাতের", args, 0) {
        Ok(s) => Value::string(s.to_lowercase()),
        Err(e) => e,
    }
}

pub fn trim(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("ছাঁটা", 1, args.len());
    }
    match as_str("ছাঁটা", args, 0) {
        Ok(s) => Value::string(s.trim().to_string()),
        Err(e) => e,
    }
}

pub fn replace(args: &[Value]) -> Value {
    if args.len() != 3 {
        return arity_error("প্রতিস্থাপন", 3, args.len());
    }
    let s = match as_str("প্রতিস্থাপন", args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let old = match as_str("প্রতিস্থাপন", args, 1) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let new = match as_str("প্রতিস্থাপন", args, 2) {
        Ok(s) => s,
        Err(e) => return e,
    };
    Value::string(s.replace(old, new))
}

pub fn index_of(args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("সূচক", 2, args.len());
    }
    let s = match as_str("সূচক", args, 0) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let needle = match as_str("সূচক", args, 1) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match s.find(needle) {
        // Byte offset converted to a code-point offset, matching `len`'s
        // code-point accounting (spec §3.3).
        Some(byte_idx) => Value::Integer(s[..byte_idx].chars().count() as i64),
        None => Value::Integer(-1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_on_separator() {
        let result = split(&[Value::string("a,b,c"), Value::string(",")]);
        assert_eq!(
            result,
            Value::array(vec![Value::string("a"), Value::string("b"), Value::string("c")])
        );
    }

    #[test]
    fn join_array_of_strings() {
        let arr = Value::array(vec![Value::string("a"), Value::string("b")]);
        assert_eq!(join(&[arr, Value::string("-")]), Value::string("a-b"));
    }

    #[test]
    fn index_of_missing_is_negative_one() {
        assert_eq!(
            index_of(&[Value::string("hello"), Value::string("z")]),
            Value::Integer(-1)
        );
    }

    #[test]
    fn replace_all_occurrences() {
        assert_eq!(
            replace(&[Value::string("aaa"), Value::string("a"), Value::string("b")]),
            Value::string("bbb")
        );
    }
}
