//! JSON built-ins (spec §4.5). Serialization uses `serde_json` rather
//! than a hand-rolled codec, matching the ambient stack's reliance on
//! the `serde` family (SPEC_FULL §2).

use super::{arity_error, type_error};
use crate::value::Value;
use serde_json::Value as Json;
use std::collections::HashMap;

fn to_json(value: &Value) -> Result<Json, Value> {
    Ok(match value {
        Value::Integer(n) => Json::Number((*n).into()),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Str(s) => Json::String(s.to_string()),
        Value::Null => Json::Null,
        Value::Array(arr) => {
            let mut items = Vec::with_capacity(arr.borrow().len());
            for item in arr.borrow().iter() {
                items.push(to_json(item)?);
            }
            Json::Array(items)
        }
        Value::Hash(hash) => {
            let mut map = serde_json::Map::new();
            for (key, val) in hash.borrow().values() {
                let key_str = match key {
                    Value::Str(s) => s.to_string(),
                    Value::Integer(n) => n.to_string(),
                    Value::Boolean(b) => b.to_string(),
                    other => {
                        return Err(Value::Error(format!(
                            "জেসন_লেখো: unsupported hash key type {}",
                            other.type_name()
                        )))
                    }
                };
                map.insert(key_str, to_json(val)?);
            }
            Json::Object(map)
        }
        other => {
            return Err(Value::Error(format!(
                "জেসন_লেখো: cannot serialize a value of type {}",
                other.type_name()
            )))
        }
    })
}

fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::boolean(*b),
        // Non-integral JSON numbers are truncated; there is no float type
        // in this value model (SPEC_FULL §3 supplement).
        Json::Number(n) => Value::Integer(n.as_i64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64)),
        Json::String(s) => Value::string(s.clone()),
        Json::Array(items) => Value::array(items.iter().map(from_json).collect()),
        Json::Object(map) => {
            let mut entries = HashMap::new();
            for (k, v) in map {
                let key = Value::string(k.clone());
                let hash_key = key.hash_key().expect("string keys are always hashable");
                entries.insert(hash_key, (key, from_json(v)));
            }
            Value::hash(entries)
        }
    }
}

pub fn parse(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("জেসন_পড়ো", 1, args.len());
    }
    let s = match &args[0] {
        Value::Str(s) => s,
        other => return type_error("জেসন_পড়ো", "string", other),
    };
    match serde_json::from_str::<Json>(s) {
        Ok(json) => from_json(&json),
        Err(err) => Value::Error(format!("জেসন_পড়ো: {err}")),
    }
}

pub fn stringify(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("জেসন_লেখো", 1, args.len());
    }
    match to_json(&args[0]) {
        Ok(json) => Value::string(json.to_string()),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stringify_then_parse_round_trips_a_hash() {
        let mut entries = HashMap::new();
        let key = Value::string("নাম");
        entries.insert(key.hash_key().unwrap(), (key, Value::string("রহিম")));
        let hash = Value::hash(entries);

        let text = stringify(&[hash]);
        let parsed = parse(&[text]);
        assert!(matches!(parsed, Value::Hash(_)));
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(parse(&[Value::string("{not json")]).is_error());
    }

    #[test]
    fn parse_truncates_floating_point_numbers() {
        assert_eq!(parse(&[Value::string("3.9")]), Value::Integer(3));
    }
}
