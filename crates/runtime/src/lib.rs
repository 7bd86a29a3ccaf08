//! Bhasa Runtime: the value model and the stack-based VM.
//!
//! - `value`: the runtime `Value` enum, the hash-key protocol, and the
//!   `TRUE`/`FALSE`/`NULL` singletons (spec §3.3).
//! - `frame`: a VM call frame (spec §3.3, §4.4).
//! - `vm`: the fetch-decode-execute loop (spec §4.4).
//! - `error`: `VmError`, the runtime-error taxonomy (spec §7).
//! - `builtins`: the fixed, order-stable built-in function table (spec §4.5).

pub mod builtins;
pub mod error;
pub mod frame;
pub mod value;
pub mod vm;

pub use builtins::BUILTINS;
pub use error::VmError;
pub use frame::Frame;
pub use value::{
    Builtin, BuiltinFn, ClosureData, CompiledFunction, EnumType, HashKey, StructData, Value, FALSE,
    NULL, TRUE,
};
pub use vm::{Bytecode, Vm};
