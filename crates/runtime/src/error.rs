//! VM runtime error type (spec §7).
//!
//! Every dispatch-time failure the VM loop can hit becomes a `VmError`,
//! following the teacher's manual `Display`/`std::error::Error` pattern
//! (`compiler::codegen::CodeGenError`) rather than pulling in `thiserror`.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
    /// Message produced by a failing built-in or a bad operation.
    Runtime(String),
    /// The operand stack exceeded its fixed capacity.
    StackOverflow,
    /// The frame stack exceeded its fixed capacity (recursion too deep).
    FrameOverflow,
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::Runtime(msg) => write!(f, "{msg}"),
            VmError::StackOverflow => write!(f, "stack overflow"),
            VmError::FrameOverflow => write!(f, "recursion too deep"),
        }
    }
}

impl std::error::Error for VmError {}

impl From<String> for VmError {
    fn from(s: String) -> Self {
        VmError::Runtime(s)
    }
}

impl From<&str> for VmError {
    fn from(s: &str) -> Self {
        VmError::Runtime(s.to_string())
    }
}
