//! Sequence (array) built-ins (spec §4.5).

use super::{arity_error, type_error};
use crate::value::Value;

/// `len`: code-point count for a string, element count for an array.
pub fn len(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("দৈর্ঘ্য", 1, args.len());
    }
    match args[0].length() {
        Some(n) => Value::Integer(n),
        None => type_error("দৈর্ঘ্য", "array or string", &args[0]),
    }
}

pub fn first(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("প্রথম", 1, args.len());
    }
    match &args[0] {
        Value::Array(arr) => arr.borrow().first().cloned().unwrap_or(Value::Null),
        other => type_error("প্রথম", "array", other),
    }
}

pub fn last(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("শেষ", 1, args.len());
    }
    match &args[0] {
        Value::Array(arr) => arr.borrow().last().cloned().unwrap_or(Value::Null),
        other => type_error("শেষ", "array", other),
    }
}

pub fn rest(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("বাকি", 1, args.len());
    }
    match &args[0] {
        Value::Array(arr) => {
            let borrowed = arr.borrow();
            if borrowed.is_empty() {
                Value::array(Vec::new())
            } else {
                Value::array(borrowed[1..].to_vec())
            }
        }
        other => type_error("বাকি", "array", other),
    }
}

/// `push`: returns a *new* array with `value` appended; the original is
/// left untouched (spec §4.5: "array + value → new array").
pub fn push(args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("যোগ", 2, args.len());
    }
    match &args[0] {
        Value::Array(arr) => {
            let mut items = arr.borrow().clone();
            items.push(args[1].clone());
            Value::array(items)
        }
        other => type_error("যোগ", "array", other),
    }
}

pub fn reverse(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("উল্টাও", 1, args.len());
    }
    match &args[0] {
        Value::Array(arr) => {
            let mut items = arr.borrow().clone();
            items.reverse();
            Value::array(items)
        }
        other => type_error("উল্টাও", "array", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_counts_array_elements() {
        let arr = Value::array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(len(&[arr]), Value::Integer(2));
    }

    #[test]
    fn len_counts_code_points_not_bytes() {
        let s = Value::string("সংখ্যা");
        assert_eq!(len(&[s.clone()]), Value::Integer(s.to_string().chars().count() as i64));
    }

    #[test]
    fn first_and_last_of_empty_array_are_null() {
        let arr = Value::array(Vec::new());
        assert_eq!(first(&[arr.clone()]), Value::Null);
        assert_eq!(last(&[arr]), Value::Null);
    }

    #[test]
    fn push_does_not_mutate_the_original() {
        let arr = Value::array(vec![Value::Integer(1)]);
        let grown = push(&[arr.clone(), Value::Integer(2)]);
        assert_eq!(len(&[arr]), Value::Integer(1));
        assert_eq!(len(&[grown]), Value::Integer(2));
    }
}
