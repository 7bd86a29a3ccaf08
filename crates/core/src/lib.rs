//! Bhasa Core: the bytecode format shared by the compiler and the VM
//!
//! This crate provides the language-agnostic wire format between the
//! single-pass compiler and the stack-based virtual machine:
//!
//! - `opcode`: byte-packed opcode definitions and their operand widths
//! - `instructions`: the `Instructions` byte buffer plus big-endian
//!   encode/decode helpers and a disassembler
//!
//! Keeping this in its own crate (rather than folding it into the
//! compiler or the runtime) means the compiler can depend on it to emit
//! bytes and the runtime can depend on it to decode them without the two
//! crates depending on each other.

pub mod instructions;
pub mod opcode;

pub use instructions::{Instructions, disassemble, make, read_operands, read_u16, read_u8};
pub use opcode::{OpCode, operand_widths};
