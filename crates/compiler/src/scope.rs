//! A compilation scope: the per-function instruction buffer plus the
//! bookkeeping needed for the single required peephole rewrite (spec
//! §4.3). Grounded on the teacher-adjacent `CompilationScope` pattern
//! (`bytecode::compilation_scope::CompilationScope` in the reference
//! bytecode-compiler corpus): a stack of these is pushed on
//! `enter_scope` and popped on `leave_scope`.

use bhasa_core::{Instructions, OpCode, make};

#[derive(Debug, Clone, Copy)]
pub struct EmittedInstruction {
    pub opcode: OpCode,
    pub position: usize,
}

pub struct CompilationScope {
    pub instructions: Instructions,
    pub last_instruction: Option<EmittedInstruction>,
    pub previous_instruction: Option<EmittedInstruction>,
}

impl CompilationScope {
    pub fn new() -> Self {
        CompilationScope {
            instructions: Instructions::new(),
            last_instruction: None,
            previous_instruction: None,
        }
    }

    pub fn emit(&mut self, op: OpCode, operands: &[usize]) -> usize {
        let position = self.instructions.len();
        self.instructions.extend(make(op, operands));
        self.previous_instruction = self.last_instruction;
        self.last_instruction = Some(EmittedInstruction { opcode: op, position });
        position
    }

    pub fn last_instruction_is(&self, op: OpCode) -> bool {
        matches!(self.last_instruction, Some(EmittedInstruction { opcode, .. }) if opcode == op)
    }

    /// Overwrites the opcode byte of the last emitted instruction in
    /// place, for the Pop→ReturnValue rewrite. Both opcodes must take
    /// no operands for this to be sound.
    pub fn replace_last_opcode(&mut self, op: OpCode) {
        if let Some(last) = self.last_instruction {
            self.instructions[last.position] = op as u8;
            self.last_instruction = Some(EmittedInstruction {
                opcode: op,
                position: last.position,
            });
        }
    }

    /// Truncate the instruction stream back to `position`, for removing
    /// a trailing `Pop` that an if-expression's consequence block would
    /// otherwise leave on the stack.
    pub fn truncate_to(&mut self, position: usize) {
        self.instructions.truncate(position);
    }

    pub fn change_operand(&mut self, position: usize, operand: usize) {
        let op = OpCode::from_byte(self.instructions[position]);
        let new_instruction = make(op, &[operand]);
        self.instructions[position..position + new_instruction.len()]
            .copy_from_slice(&new_instruction);
    }
}

impl Default for CompilationScope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_tracks_last_and_previous() {
        let mut scope = CompilationScope::new();
        scope.emit(OpCode::Constant, &[1]);
        scope.emit(OpCode::Pop, &[]);
        assert!(scope.last_instruction_is(OpCode::Pop));
        assert_eq!(
            scope.previous_instruction.map(|i| i.opcode),
            Some(OpCode::Constant)
        );
    }

    #[test]
    fn replace_last_opcode_rewrites_in_place() {
        let mut scope = CompilationScope::new();
        scope.emit(OpCode::Pop, &[]);
        scope.replace_last_opcode(OpCode::ReturnValue);
        assert_eq!(scope.instructions, vec![OpCode::ReturnValue as u8]);
    }

    #[test]
    fn change_operand_rewrites_jump_target() {
        let mut scope = CompilationScope::new();
        let pos = scope.emit(OpCode::Jump, &[0xFFFF]);
        scope.change_operand(pos, 7);
        assert_eq!(scope.instructions, vec![OpCode::Jump as u8, 0, 7]);
    }
}
