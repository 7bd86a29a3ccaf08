//! A VM call frame (spec §3.3, §4.4, GLOSSARY).
//!
//! A frame owns no values directly — only the active closure, an
//! instruction pointer, and a base pointer into the shared operand
//! stack. Local slot `i` of the currently executing closure lives at
//! `stack[base_pointer + i]`.

use crate::value::ClosureData;
use std::rc::Rc;

pub struct Frame {
    pub closure: Rc<ClosureData>,
    /// Signed and initialized to -1: the dispatch loop increments
    /// before every fetch, so the first executed instruction is at
    /// index 0 (spec §4.4).
    pub ip: isize,
    pub base_pointer: usize,
}

impl Frame {
    pub fn new(closure: Rc<ClosureData>, base_pointer: usize) -> Self {
        Frame {
            closure,
            ip: -1,
            base_pointer,
        }
    }

    pub fn instructions(&self) -> &[u8] {
        &self.closure.function.instructions
    }
}
