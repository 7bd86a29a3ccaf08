//! The stack-based virtual machine (spec §4.4).

use crate::error::VmError;
use crate::frame::Frame;
use crate::value::{ClosureData, CompiledFunction, Value};
use bhasa_core::{read_u16, read_u8, OpCode};
use std::collections::HashMap;
use std::rc::Rc;

const STACK_SIZE: usize = 2048;
const GLOBALS_SIZE: usize = 65536;
const MAX_FRAMES: usize = 1024;

/// Everything a compiler run hands the VM: the compiled instruction
/// stream (wrapped in a zero-parameter main function) and the constant
/// pool it indexes into.
pub struct Bytecode {
    pub instructions: bhasa_core::Instructions,
    pub constants: Vec<Value>,
}

pub struct Vm {
    constants: Vec<Value>,
    stack: Vec<Value>,
    sp: usize,
    pub globals: Vec<Value>,
    frames: Vec<Frame>,
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        Self::with_globals(bytecode, vec![Value::Null; GLOBALS_SIZE])
    }

    /// Reuse a globals vector across runs, so a REPL can carry bindings
    /// from one compiled line into the next (spec §6.6 GLOSSARY, REPL).
    pub fn with_globals(bytecode: Bytecode, globals: Vec<Value>) -> Self {
        let main_fn = Rc::new(CompiledFunction {
            instructions: bytecode.instructions,
            num_locals: 0,
            num_parameters: 0,
        });
        let main_closure = Rc::new(ClosureData {
            function: main_fn,
            free: Vec::new(),
        });
        let mut frames = Vec::with_capacity(MAX_FRAMES);
        frames.push(Frame::new(main_closure, 0));

        Vm {
            constants: bytecode.constants,
            stack: vec![Value::Null; STACK_SIZE],
            sp: 0,
            globals,
            frames,
        }
    }

    pub fn stack_top(&self) -> Option<&Value> {
        if self.sp == 0 {
            None
        } else {
            Some(&self.stack[self.sp - 1])
        }
    }

    /// What `Pop` most recently discarded — `Pop` decrements `sp` but
    /// never clears the slot, so it's still readable here (spec §4.4).
    pub fn last_popped_stack_element(&self) -> Option<&Value> {
        self.stack.get(self.sp)
    }

    fn push(&mut self, value: Value) -> Result<(), VmError> {
        if self.sp >= STACK_SIZE {
            return Err(VmError::StackOverflow);
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Value {
        self.sp -= 1;
        std::mem::replace(&mut self.stack[self.sp], Value::Null)
    }

    fn current_frame(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty")
    }

    pub fn run(&mut self) -> Result<(), VmError> {
        loop {
            let (ip, instructions_len) = {
                let frame = self.current_frame();
                (frame.ip, frame.instructions().len())
            };
            if ip as usize + 1 >= instructions_len {
                if self.frames.len() == 1 {
                    return Ok(());
                }
                // A function body fell off the end without an explicit
                // `Return`/`ReturnValue`; treat it as an implicit Return.
                self.do_return(Value::Null)?;
                continue;
            }

            self.current_frame().ip += 1;
            let ip = self.current_frame().ip as usize;
            let instructions = self.current_frame().instructions().to_vec();
            let op = OpCode::from_byte(instructions[ip]);

            match op {
                OpCode::Constant => {
                    let idx = read_u16(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 2;
                    self.push(self.constants[idx].clone())?;
                }
                OpCode::Null => self.push(Value::Null)?,
                OpCode::True => self.push(Value::boolean(true))?,
                OpCode::False => self.push(Value::boolean(false))?,
                OpCode::Pop => {
                    self.sp -= 1;
                }
                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Mod => {
                    self.exec_binary_arithmetic(op)?;
                }
                OpCode::BitAnd | OpCode::BitOr | OpCode::BitXor | OpCode::LeftShift | OpCode::RightShift => {
                    self.exec_binary_bitwise(op)?;
                }
                OpCode::Minus => {
                    let operand = self.pop();
                    match operand {
                        Value::Integer(n) => self.push(Value::Integer(-n))?,
                        other => {
                            self.push(Value::Error(format!(
                                "unsupported operand for unary -: {}",
                                other.type_name()
                            )))?;
                            return self.halt_on_top_error();
                        }
                    }
                }
                OpCode::BitNot => {
                    let operand = self.pop();
                    match operand {
                        Value::Integer(n) => self.push(Value::Integer(!n))?,
                        other => {
                            self.push(Value::Error(format!(
                                "unsupported operand for ~: {}",
                                other.type_name()
                            )))?;
                            return self.halt_on_top_error();
                        }
                    }
                }
                OpCode::Bang => {
                    let operand = self.pop();
                    let result = match operand {
                        Value::Boolean(true) => Value::boolean(false),
                        Value::Boolean(false) => Value::boolean(true),
                        Value::Null => Value::boolean(true),
                        _ => Value::boolean(false),
                    };
                    self.push(result)?;
                }
                OpCode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::boolean(a == b))?;
                }
                OpCode::NotEqual => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::boolean(a != b))?;
                }
                OpCode::GreaterThan | OpCode::GreaterThanEqual => {
                    self.exec_comparison(op)?;
                }
                OpCode::Jump => {
                    let target = read_u16(&instructions, ip + 1) as isize;
                    self.current_frame().ip = target - 1;
                }
                OpCode::JumpNotTruthy => {
                    let target = read_u16(&instructions, ip + 1) as isize;
                    self.current_frame().ip += 2;
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.current_frame().ip = target - 1;
                    }
                }
                OpCode::GetGlobal => {
                    let idx = read_u16(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 2;
                    self.push(self.globals[idx].clone())?;
                }
                OpCode::SetGlobal => {
                    let idx = read_u16(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 2;
                    let value = self.pop();
                    self.globals[idx] = value;
                }
                OpCode::GetLocal => {
                    let idx = read_u8(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 1;
                    let bp = self.current_frame().base_pointer;
                    self.push(self.stack[bp + idx].clone())?;
                }
                OpCode::SetLocal => {
                    let idx = read_u8(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 1;
                    let bp = self.current_frame().base_pointer;
                    let value = self.pop();
                    self.stack[bp + idx] = value;
                }
                OpCode::GetBuiltin => {
                    let idx = read_u8(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 1;
                    let (name, func) = crate::builtins::BUILTINS[idx];
                    self.push(Value::Builtin(crate::value::Builtin { name, func }))?;
                }
                OpCode::GetFree => {
                    let idx = read_u8(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 1;
                    let value = self.current_frame().closure.free[idx].clone();
                    self.push(value)?;
                }
                OpCode::CurrentClosure => {
                    let closure = self.current_frame().closure.clone();
                    self.push(Value::Closure(closure))?;
                }
                OpCode::Array => {
                    let n = read_u16(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 2;
                    let elements = self.stack[self.sp - n..self.sp].to_vec();
                    self.sp -= n;
                    self.push(Value::array(elements))?;
                }
                OpCode::Hash => {
                    let n = read_u16(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 2;
                    let entries = self.stack[self.sp - 2 * n..self.sp].to_vec();
                    self.sp -= 2 * n;
                    let mut pairs = HashMap::with_capacity(n);
                    for pair in entries.chunks(2) {
                        let key = pair[0].clone();
                        let value = pair[1].clone();
                        match key.hash_key() {
                            Some(hk) => {
                                pairs.insert(hk, (key, value));
                            }
                            None => {
                                self.push(Value::Error(format!(
                                    "unusable as hash key: {}",
                                    key.type_name()
                                )))?;
                                return self.halt_on_top_error();
                            }
                        }
                    }
                    self.push(Value::hash(pairs))?;
                }
                OpCode::Index => {
                    let index = self.pop();
                    let collection = self.pop();
                    self.exec_index(collection, index)?;
                }
                OpCode::Call => {
                    let argcount = read_u8(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 1;
                    self.exec_call(argcount)?;
                }
                OpCode::ReturnValue => {
                    let value = self.pop();
                    self.do_return(value)?;
                }
                OpCode::Return => {
                    self.do_return(Value::Null)?;
                }
                OpCode::Closure => {
                    let fn_idx = read_u16(&instructions, ip + 1) as usize;
                    let n_free = read_u8(&instructions, ip + 3) as usize;
                    self.current_frame().ip += 3;
                    let function = match &self.constants[fn_idx] {
                        Value::CompiledFunction(f) => f.clone(),
                        other => {
                            return Err(VmError::Runtime(format!(
                                "not a compiled function: {}",
                                other.type_name()
                            )))
                        }
                    };
                    // Free vars are pushed in declared order, so the slice
                    // from sp-n_free..sp already reads low-to-high in that order.
                    let free = self.stack[self.sp - n_free..self.sp].to_vec();
                    self.sp -= n_free;
                    self.push(Value::Closure(Rc::new(ClosureData { function, free })))?;
                }
                OpCode::AssertType => {
                    let idx = read_u16(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 2;
                    let expected = self.constants[idx].to_string();
                    let actual = self.stack_top().map(|v| v.type_name()).unwrap_or("null");
                    if actual != expected {
                        tracing::warn!(expected = %expected, actual = %actual, "assert-type mismatch");
                    }
                }
                OpCode::Struct => {
                    let n = read_u8(&instructions, ip + 1) as usize;
                    self.current_frame().ip += 1;
                    let entries = self.stack[self.sp - 2 * n..self.sp].to_vec();
                    self.sp -= 2 * n;
                    let mut fields = HashMap::with_capacity(n);
                    for pair in entries.chunks(2) {
                        let name = pair[0].to_string();
                        fields.insert(name, pair[1].clone());
                    }
                    self.push(Value::Struct(Rc::new(crate::value::StructData {
                        fields: std::cell::RefCell::new(fields),
                    })))?;
                }
                OpCode::GetStructField => {
                    let name = self.pop();
                    let object = self.pop();
                    self.exec_get_field(object, name)?;
                }
                OpCode::SetStructField => {
                    let value = self.pop();
                    let name = self.pop();
                    let object = self.pop();
                    self.exec_set_field(object, name, value)?;
                }
            }
        }
    }

    fn halt_on_top_error(&self) -> Result<(), VmError> {
        match self.stack.get(self.sp.wrapping_sub(1)) {
            Some(Value::Error(msg)) => Err(VmError::Runtime(msg.clone())),
            _ => Ok(()),
        }
    }

    fn exec_binary_arithmetic(&mut self, op: OpCode) -> Result<(), VmError> {
        let b = self.pop();
        let a = self.pop();
        let result = match (&a, &b, op) {
            (Value::Integer(x), Value::Integer(y), OpCode::Add) => Value::Integer(x + y),
            (Value::Integer(x), Value::Integer(y), OpCode::Sub) => Value::Integer(x - y),
            (Value::Integer(x), Value::Integer(y), OpCode::Mul) => Value::Integer(x * y),
            (Value::Integer(x), Value::Integer(y), OpCode::Div) => {
                if *y == 0 {
                    Value::Error("division by zero".to_string())
                } else {
                    Value::Integer(x / y)
                }
            }
            (Value::Integer(x), Value::Integer(y), OpCode::Mod) => {
                if *y == 0 {
                    Value::Error("modulo by zero".to_string())
                } else {
                    Value::Integer(x % y)
                }
            }
            (Value::Str(x), Value::Str(y), OpCode::Add) => Value::string(format!("{x}{y}")),
            _ => Value::Error(format!(
                "unsupported operand types for {op}: {} and {}",
                a.type_name(),
                b.type_name()
            )),
        };
        let is_error = result.is_error();
        self.push(result)?;
        if is_error {
            return self.halt_on_top_error();
        }
        Ok(())
    }

    fn exec_binary_bitwise(&mut self, op: OpCode) -> Result<(), VmError> {
        let b = self.pop();
        let a = self.pop();
        let result = match (&a, &b) {
            (Value::Integer(x), Value::Integer(y)) => match op {
                OpCode::BitAnd => Value::Integer(x & y),
                OpCode::BitOr => Value::Integer(x | y),
                OpCode::BitXor => Value::Integer(x ^ y),
                OpCode::LeftShift => Value::Integer(x.wrapping_shl((*y as u32) % 64)),
                OpCode::RightShift => Value::Integer(x.wrapping_shr((*y as u32) % 64)),
                _ => unreachable!(),
            },
            _ => Value::Error(format!(
                "unsupported operand types for {op}: {} and {}",
                a.type_name(),
                b.type_name()
            )),
        };
        let is_error = result.is_error();
        self.push(result)?;
        if is_error {
            return self.halt_on_top_error();
        }
        Ok(())
    }

    fn exec_comparison(&mut self, op: OpCode) -> Result<(), VmError> {
        let b = self.pop();
        let a = self.pop();
        let result = match (&a, &b) {
            (Value::Integer(x), Value::Integer(y)) => match op {
                OpCode::GreaterThan => Value::boolean(x > y),
                OpCode::GreaterThanEqual => Value::boolean(x >= y),
                _ => unreachable!(),
            },
            _ => Value::Error(format!(
                "unsupported operand types for {op}: {} and {}",
                a.type_name(),
                b.type_name()
            )),
        };
        let is_error = result.is_error();
        self.push(result)?;
        if is_error {
            return self.halt_on_top_error();
        }
        Ok(())
    }

    fn exec_index(&mut self, collection: Value, index: Value) -> Result<(), VmError> {
        let result = match (&collection, &index) {
            (Value::Array(arr), Value::Integer(i)) => {
                let borrowed = arr.borrow();
                if *i < 0 || *i as usize >= borrowed.len() {
                    Value::Null
                } else {
                    borrowed[*i as usize].clone()
                }
            }
            (Value::Hash(map), key) => match key.hash_key() {
                Some(hk) => map.borrow().get(&hk).map(|(_, v)| v.clone()).unwrap_or(Value::Null),
                None => Value::Error(format!("unusable as hash key: {}", key.type_name())),
            },
            _ => Value::Error(format!(
                "index operator not supported for {} and {}",
                collection.type_name(),
                index.type_name()
            )),
        };
        let is_error = result.is_error();
        self.push(result)?;
        if is_error {
            return self.halt_on_top_error();
        }
        Ok(())
    }

    fn exec_get_field(&mut self, object: Value, name: Value) -> Result<(), VmError> {
        let field_name = name.to_string();
        let result = match &object {
            Value::Struct(data) => data
                .fields
                .borrow()
                .get(&field_name)
                .cloned()
                .unwrap_or(Value::Error(format!("no such field: {field_name}"))),
            Value::EnumType(enum_type) => match enum_type.value_of(&field_name) {
                Some(value) => Value::Enum {
                    type_name: enum_type.name.as_str().into(),
                    variant_name: field_name.as_str().into(),
                    value,
                },
                None => Value::Error(format!("no such variant: {}.{field_name}", enum_type.name)),
            },
            other => Value::Error(format!("cannot access a field on {}", other.type_name())),
        };
        let is_error = result.is_error();
        self.push(result)?;
        if is_error {
            return self.halt_on_top_error();
        }
        Ok(())
    }

    fn exec_set_field(&mut self, object: Value, name: Value, value: Value) -> Result<(), VmError> {
        match &object {
            Value::Struct(data) => {
                data.fields.borrow_mut().insert(name.to_string(), value.clone());
                self.push(value)
            }
            other => {
                let err = Value::Error(format!("cannot assign a field on {}", other.type_name()));
                self.push(err)?;
                self.halt_on_top_error()
            }
        }
    }

    fn exec_call(&mut self, argcount: usize) -> Result<(), VmError> {
        let callee = self.stack[self.sp - argcount - 1].clone();
        match callee {
            Value::Closure(closure) => {
                if argcount != closure.function.num_parameters {
                    let err = Value::Error(format!(
                        "wrong number of arguments: expected {}, got {argcount}",
                        closure.function.num_parameters
                    ));
                    self.push(err)?;
                    return self.halt_on_top_error();
                }
                if self.frames.len() >= MAX_FRAMES {
                    return Err(VmError::FrameOverflow);
                }
                let base_pointer = self.sp - argcount;
                self.sp = base_pointer + closure.function.num_locals;
                self.frames.push(Frame::new(closure, base_pointer));
                Ok(())
            }
            Value::Builtin(builtin) => {
                let args = self.stack[self.sp - argcount..self.sp].to_vec();
                let result = (builtin.func)(&args);
                self.sp = self.sp - argcount - 1;
                let is_error = result.is_error();
                self.push(result)?;
                if is_error {
                    return self.halt_on_top_error();
                }
                Ok(())
            }
            other => {
                let err = Value::Error(format!("not a function: {}", other.type_name()));
                self.push(err)?;
                self.halt_on_top_error()
            }
        }
    }

    fn do_return(&mut self, value: Value) -> Result<(), VmError> {
        let frame = self.frames.pop().expect("frame stack is never empty");
        self.sp = frame.base_pointer - 1;
        self.push(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhasa_core::{make, OpCode as Op};

    fn run(instructions: bhasa_core::Instructions, constants: Vec<Value>) -> Vm {
        let mut vm = Vm::new(Bytecode { instructions, constants });
        vm.run().expect("vm run should not error");
        vm
    }

    #[test]
    fn adds_two_integer_constants() {
        let mut ins = bhasa_core::Instructions::new();
        ins.extend(make(Op::Constant, &[0]));
        ins.extend(make(Op::Constant, &[1]));
        ins.extend(make(Op::Add, &[]));
        let vm = run(ins, vec![Value::Integer(2), Value::Integer(3)]);
        assert_eq!(vm.stack_top(), Some(&Value::Integer(5)));
    }

    #[test]
    fn division_by_zero_is_a_vm_error() {
        let mut ins = bhasa_core::Instructions::new();
        ins.extend(make(Op::Constant, &[0]));
        ins.extend(make(Op::Constant, &[1]));
        ins.extend(make(Op::Div, &[]));
        let mut vm = Vm::new(Bytecode {
            instructions: ins,
            constants: vec![Value::Integer(1), Value::Integer(0)],
        });
        assert!(vm.run().is_err());
    }

    #[test]
    fn global_bindings_round_trip() {
        let mut ins = bhasa_core::Instructions::new();
        ins.extend(make(Op::Constant, &[0]));
        ins.extend(make(Op::SetGlobal, &[0]));
        ins.extend(make(Op::GetGlobal, &[0]));
        let vm = run(ins, vec![Value::Integer(42)]);
        assert_eq!(vm.stack_top(), Some(&Value::Integer(42)));
    }

    #[test]
    fn index_out_of_range_is_null_not_error() {
        let mut ins = bhasa_core::Instructions::new();
        ins.extend(make(Op::Array, &[0]));
        ins.extend(make(Op::Constant, &[0]));
        ins.extend(make(Op::Index, &[]));
        let vm = run(ins, vec![Value::Integer(9)]);
        assert_eq!(vm.stack_top(), Some(&Value::Null));
    }
}
