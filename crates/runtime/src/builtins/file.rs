//! File built-ins (spec §4.5). Block the VM for the duration of the
//! host OS call (spec §5) — there is no async I/O in this runtime.

use super::{arity_error, type_error};
use crate::value::Value;
use std::fs;
use std::io::Write as _;

fn as_path<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a str, Value> {
    match &args[index] {
        Value::Str(s) => Ok(s),
        other => Err(type_error(name, "string", other)),
    }
}

pub fn read(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("পড়ো", 1, args.len());
    }
    let path = match as_path("পড়ো", args, 0) {
        Ok(p) => p,
        Err(e) => return e,
    };
    match fs::read_to_string(path) {
        Ok(contents) => Value::string(contents),
        Err(err) => Value::Error(format!("পড়ো: {path}: {err}")),
    }
}

pub fn write(args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("লেখো", 2, args.len());
    }
    let path = match as_path("লেখো", args, 0) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let content = match as_path("লেখো", args, 1) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match fs::write(path, content) {
        Ok(()) => Value::Null,
        Err(err) => Value::Error(format!("লেখো: {path}: {err}")),
    }
}

pub fn append(args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("জুড়ে_দাও", 2, args.len());
    }
    let path = match as_path("জুড়ে_দাও", args, 0) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let content = match as_path("জুড়ে_দাও", args, 1) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let result = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| f.write_all(content.as_bytes()));
    match result {
        Ok(()) => Value::Null,
        Err(err) => Value::Error(format!("জুড়ে_দাও: {path}: {err}")),
    }
}

pub fn exists(args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("আছে_কি", 1, args.len());
    }
    match as_path("আছে_কি", args, 0) {
        Ok(path) => Value::boolean(std::path::Path::new(path).exists()),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let path_str = path.to_str().unwrap();

        assert_eq!(
            write(&[Value::string(path_str), Value::string("hello")]),
            Value::Null
        );
        assert_eq!(read(&[Value::string(path_str)]), Value::string("hello"));
        assert_eq!(exists(&[Value::string(path_str)]), Value::boolean(true));
    }

    #[test]
    fn append_creates_and_extends_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let path_str = path.to_str().unwrap();

        append(&[Value::string(path_str), Value::string("a")]);
        append(&[Value::string(path_str), Value::string("b")]);
        assert_eq!(read(&[Value::string(path_str)]), Value::string("ab"));
    }

    #[test]
    fn read_missing_file_is_an_error() {
        assert!(read(&[Value::string("/nonexistent/path/x")]).is_error());
    }

    #[test]
    fn exists_is_false_for_missing_path() {
        assert_eq!(
            exists(&[Value::string("/nonexistent/path/x")]),
            Value::boolean(false)
        );
    }
}
