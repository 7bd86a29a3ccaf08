//! Runtime value model (spec §3.3).
//!
//! A `Value` is what the VM's operand stack, globals array, and constant
//! pool hold. `TRUE`/`FALSE`/`NULL` are conceptually interned singletons
//! (spec §9): they are zero-sized to construct, so we simply clone them
//! rather than chasing a shared allocation.

use bhasa_core::Instructions;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A compiled function body, shared (never mutated) once built.
#[derive(Debug, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A closure pairs a `CompiledFunction` with its captured free values.
/// The function is shared; the free vector is exclusively owned by the
/// closure (spec §3.3) — two closures built from the same function body
/// each get their own snapshot of captured values.
#[derive(Debug, PartialEq)]
pub struct ClosureData {
    pub function: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

/// A host-provided built-in. Builtins are stateless, so a plain function
/// pointer (rather than a boxed closure) is enough and keeps `Value: Copy`
/// for this variant's payload.
pub type BuiltinFn = fn(&[Value]) -> Value;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// An enum *type*: its declared name and its ordered (variant, value)
/// table. Produced by compiling an `EnumDef` expression directly into
/// the constant pool (spec §4.7).
#[derive(Debug, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<(String, i64)>,
}

impl EnumType {
    pub fn value_of(&self, variant: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|(name, _)| name == variant)
            .map(|(_, value)| *value)
    }
}

/// A struct instance: an unordered field bag, shared by reference so
/// that `SetStructField` mutation through one binding is visible through
/// any other binding that captured the same struct (spec §3.3, §8).
#[derive(Debug, PartialEq)]
pub struct StructData {
    pub fields: RefCell<HashMap<String, Value>>,
}

/// The hashable subset of `Value` (spec §3.3): Integer, Boolean, String.
/// A hash key is the pair `(type-tag, 64-bit value)`; strings are
/// reduced to a 64-bit FNV-1a digest so two equal strings always produce
/// the same key regardless of their different heap addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    tag: u8,
    bits: u64,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// FNV-1a over raw bytes. Fixed so literal hash maps compile
/// deterministically across runs and implementations (spec §3.3).
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A runtime value (spec §3.3).
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    /// `Rc<str>` rather than `String`: strings are frequently duplicated
    /// onto the stack (e.g. re-pushed as a hash/struct field name) and
    /// never mutated in place, so sharing the backing buffer avoids a
    /// copy on every clone.
    Str(Rc<str>),
    Null,
    Array(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<RefCell<HashMap<HashKey, (Value, Value)>>>),
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<ClosureData>),
    Builtin(Builtin),
    /// A diagnostic produced by the VM or a built-in when an operation
    /// fails (spec §3.3). Not a Rust `Result` — it travels on the stack
    /// like any other value so a program can inspect it.
    Error(String),
    EnumType(Rc<EnumType>),
    Enum {
        type_name: Rc<str>,
        variant_name: Rc<str>,
        value: i64,
    },
    Struct(Rc<StructData>),
}

pub const TRUE: Value = Value::Boolean(true);
pub const FALSE: Value = Value::Boolean(false);
pub const NULL: Value = Value::Null;

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn hash(pairs: HashMap<HashKey, (Value, Value)>) -> Value {
        Value::Hash(Rc::new(RefCell::new(pairs)))
    }

    /// Returns the boolean singleton for `b`, matching the spec's
    /// interned-singleton convention (spec §9).
    pub fn boolean(b: bool) -> Value {
        if b { TRUE } else { FALSE }
    }

    /// isTruthy (spec §4.4 `JumpNotTruthy`): only `Null` and `false` are
    /// falsy; everything else, including `0` and `""`, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The `(type-tag, 64-bit value)` hash key for the hashable subset of
    /// values (spec §3.3). `None` for everything else.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(i) => Some(HashKey {
                tag: 0,
                bits: *i as u64,
            }),
            Value::Boolean(b) => Some(HashKey {
                tag: 1,
                bits: if *b { 1 } else { 0 },
            }),
            Value::Str(s) => Some(HashKey {
                tag: 2,
                bits: fnv1a_64(s.as_bytes()),
            }),
            _ => None,
        }
    }

    /// The string tag returned by the `type-of` builtin (spec §4.5).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Str(_) => "string",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Hash(_) => "hash",
            Value::CompiledFunction(_) => "function",
            Value::Closure(_) => "function",
            Value::Builtin(_) => "builtin",
            Value::Error(_) => "error",
            Value::EnumType(_) => "enum-type",
            Value::Enum { .. } => "enum",
            Value::Struct(_) => "struct",
        }
    }

    /// Code-point count for strings, element count for arrays (spec
    /// §3.3, used by the `len` builtin).
    pub fn length(&self) -> Option<i64> {
        match self {
            Value::Str(s) => Some(s.chars().count() as i64),
            Value::Array(arr) => Some(arr.borrow().len() as i64),
            _ => None,
        }
    }
}

/// Value-equal (spec §4.4 `Equal`): integers/booleans by value, strings
/// by content, null=null, arrays/hashes by deep structural equality,
/// cross-type is never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => *a.borrow() == *b.borrow(),
            (Value::Hash(a), Value::Hash(b)) => *a.borrow() == *b.borrow(),
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::EnumType(a), Value::EnumType(b)) => Rc::ptr_eq(a, b) || a == b,
            (
                Value::Enum {
                    type_name: t1,
                    variant_name: v1,
                    value: n1,
                },
                Value::Enum {
                    type_name: t2,
                    variant_name: v2,
                    value: n2,
                },
            ) => t1 == t2 && v1 == v2 && n1 == n2,
            (Value::Struct(a), Value::Struct(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Null => write!(f, "null"),
            Value::Array(arr) => {
                let items: Vec<String> = arr.borrow().iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Hash(map) => {
                let items: Vec<String> = map
                    .borrow()
                    .values()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Value::CompiledFunction(_) => write!(f, "<function>"),
            Value::Closure(_) => write!(f, "<function>"),
            Value::Builtin(b) => write!(f, "<builtin {}>", b.name),
            Value::Error(msg) => write!(f, "ত্রুটি: {msg}"),
            Value::EnumType(t) => write!(f, "<enum-type {}>", t.name),
            Value::Enum {
                type_name,
                variant_name,
                ..
            } => write!(f, "{type_name}.{variant_name}"),
            Value::Struct(s) => {
                let items: Vec<String> = s
                    .fields
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect();
                write!(f, "{{{}}}", items.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_are_value_equal_not_identity() {
        assert_eq!(Value::boolean(true), Value::Boolean(true));
    }

    #[test]
    fn strings_equal_by_content() {
        assert_eq!(Value::string("hi"), Value::string("hi"));
        assert_ne!(Value::string("hi"), Value::string("bye"));
    }

    #[test]
    fn arrays_equal_structurally() {
        let a = Value::array(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(a, b);
    }

    #[test]
    fn hash_key_is_stable_for_equal_strings() {
        let a = Value::string("same");
        let b = Value::string("same");
        assert_eq!(a.hash_key(), b.hash_key());
    }

    #[test]
    fn cross_type_never_equal() {
        assert_ne!(Value::Integer(0), Value::Boolean(false));
        assert_ne!(Value::Null, Value::Integer(0));
    }

    #[test]
    fn is_truthy_matches_spec() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn struct_equality_is_by_identity() {
        let s = Rc::new(StructData {
            fields: RefCell::new(HashMap::new()),
        });
        let a = Value::Struct(s.clone());
        let b = Value::Struct(s);
        assert_eq!(a, b);
        let c = Value::Struct(Rc::new(StructData {
            fields: RefCell::new(HashMap::new()),
        }));
        assert_ne!(a, c);
    }
}
