//! AST → bytecode lowering: the single-pass compiler (spec §4.3).
//!
//! `Compiler` is stateful: `compile(&program)` walks the AST once,
//! emitting into the current `CompilationScope` and filling a shared
//! constant pool, resolving every identifier against the lexically
//! scoped `SymbolTable` as it goes. Recompiling on the same instance
//! after an error is not supported, matching the contract in spec §4.3.

use crate::ast::{Block, Expr, Param, Program, Stmt};
use crate::config::CompilerConfig;
use crate::parser;
use crate::scope::CompilationScope;
use crate::symbol_table::{Symbol, SymbolScope, SymbolTable};
use bhasa_core::{Instructions, OpCode};
use bhasa_runtime::{Bytecode, CompiledFunction, EnumType, Value};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    UndefinedIdentifier(String),
    BreakOutsideLoop,
    ContinueOutsideLoop,
    InvalidAssignTarget(String),
    InvalidImportPath(String),
    ModuleLoadError(String),
    ModuleParseError(String, Vec<String>),
    UnknownOperator(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UndefinedIdentifier(name) => write!(f, "undefined identifier: {name}"),
            CompileError::BreakOutsideLoop => write!(f, "বিরতি (break) used outside a loop"),
            CompileError::ContinueOutsideLoop => {
                write!(f, "চালিয়ে_যাও (continue) used outside a loop")
            }
            CompileError::InvalidAssignTarget(name) => {
                write!(f, "cannot assign to {name}: not an assignable binding")
            }
            CompileError::InvalidImportPath(at) => {
                write!(f, "{at}: import path must be a string literal")
            }
            CompileError::ModuleLoadError(msg) => write!(f, "{msg}"),
            CompileError::ModuleParseError(path, errors) => {
                write!(f, "parse errors in module \"{path}\": {}", errors.join("; "))
            }
            CompileError::UnknownOperator(op) => write!(f, "unknown operator: {op}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Accumulates `Jump`/`JumpNotTruthy` placeholder positions for
/// `break`/`continue` until the enclosing loop's boundaries are known
/// (spec §4.3 While/For).
struct LoopContext {
    start: usize,
    breaks: Vec<usize>,
    continues: Vec<usize>,
}

pub struct Compiler {
    constants: Vec<Value>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
    scope_index: usize,
    loops: Vec<LoopContext>,
    config: CompilerConfig,
    imported: HashSet<String>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::new())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        let mut symbol_table = SymbolTable::new();
        for (index, (name, _)) in bhasa_runtime::BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index, name);
        }
        Compiler {
            constants: Vec::new(),
            symbol_table,
            scopes: vec![CompilationScope::new()],
            scope_index: 0,
            loops: Vec::new(),
            config,
            imported: HashSet::new(),
        }
    }

    /// Resume compiling into an existing global scope, so a REPL can
    /// carry bindings from one compiled line into the next (SPEC_FULL
    /// §2 REPL, teacher's `new_with_state`/`take_state` convention).
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Self {
        Compiler {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::new()],
            scope_index: 0,
            loops: Vec::new(),
            config: CompilerConfig::new(),
            imported: HashSet::new(),
        }
    }

    pub fn take_state(self) -> (SymbolTable, Vec<Value>) {
        (self.symbol_table, self.constants)
    }

    pub fn compile(&mut self, program: &Program) -> Result<(), CompileError> {
        self.compile_statements(&program.statements)
    }

    /// The compiled main instructions plus the constant pool, per spec
    /// §4.3's `bytecode()` contract.
    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.scopes[self.scope_index].instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    // ---- scope / emission plumbing ----

    fn current_scope(&mut self) -> &mut CompilationScope {
        &mut self.scopes[self.scope_index]
    }

    fn emit(&mut self, op: OpCode, operands: &[usize]) -> usize {
        self.current_scope().emit(op, operands)
    }

    fn add_constant(&mut self, value: Value) -> u16 {
        self.constants.push(value);
        (self.constants.len() - 1) as u16
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::new());
        self.scope_index += 1;
        let outer = std::mem::replace(&mut self.symbol_table, SymbolTable::new());
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().expect("scope stack is never empty here");
        self.scope_index -= 1;
        let current = std::mem::replace(&mut self.symbol_table, SymbolTable::new());
        self.symbol_table = current
            .into_outer()
            .expect("leave_scope always follows enter_scope, which always sets an outer table");
        scope.instructions
    }

    /// Unconditionally drops the trailing `Pop`, used where a block's
    /// expression-statement value should remain on the stack (if-branches,
    /// loop bodies).
    fn remove_last_pop(&mut self) {
        let scope = self.current_scope();
        let pos = scope
            .last_instruction
            .expect("remove_last_pop called only when last_instruction_is(Pop)")
            .position;
        scope.truncate_to(pos);
        scope.last_instruction = scope.previous_instruction;
    }

    fn strip_trailing_pop(&mut self) {
        if self.current_scope().last_instruction_is(OpCode::Pop) {
            self.remove_last_pop();
        }
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(OpCode::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(OpCode::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(OpCode::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(OpCode::GetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(OpCode::CurrentClosure, &[]),
        };
    }

    // ---- statements ----

    fn compile_statements(&mut self, statements: &[Stmt]) -> Result<(), CompileError> {
        for stmt in statements {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    fn compile_statement(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Let {
                name,
                type_annotation,
                value,
                ..
            } => {
                // Reserved before compiling the value so recursive
                // top-level bindings can resolve their own name (spec §4.3).
                let symbol = self.symbol_table.define(name, type_annotation.clone());
                self.compile_expr(value)?;
                if let Some(ty) = type_annotation {
                    let idx = self.add_constant(Value::string(ty.to_string()));
                    self.emit(OpCode::AssertType, &[idx as usize]);
                }
                match symbol.scope {
                    SymbolScope::Global => self.emit(OpCode::SetGlobal, &[symbol.index]),
                    SymbolScope::Local => self.emit(OpCode::SetLocal, &[symbol.index]),
                    other => unreachable!("symbol_table::define never produces {other:?}"),
                };
                Ok(())
            }
            Stmt::Assign { name, value, .. } => {
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| CompileError::UndefinedIdentifier(name.clone()))?;
                if matches!(symbol.scope, SymbolScope::Free | SymbolScope::Builtin | SymbolScope::Function) {
                    return Err(CompileError::InvalidAssignTarget(name.clone()));
                }
                self.compile_expr(value)?;
                match symbol.scope {
                    SymbolScope::Global => self.emit(OpCode::SetGlobal, &[symbol.index]),
                    SymbolScope::Local => self.emit(OpCode::SetLocal, &[symbol.index]),
                    other => unreachable!("filtered above: {other:?}"),
                };
                Ok(())
            }
            Stmt::Return { value, .. } => {
                self.compile_expr(value)?;
                self.emit(OpCode::ReturnValue, &[]);
                Ok(())
            }
            Stmt::ExprStmt { expr, .. } => {
                self.compile_expr(expr)?;
                self.emit(OpCode::Pop, &[]);
                Ok(())
            }
            Stmt::Block { statements, .. } => self.compile_statements(statements),
            Stmt::While { condition, body, .. } => self.compile_while(condition, body),
            Stmt::For {
                init,
                condition,
                increment,
                body,
                ..
            } => self.compile_for(init, condition, increment, body),
            Stmt::Break { .. } => {
                if self.loops.is_empty() {
                    return Err(CompileError::BreakOutsideLoop);
                }
                let pos = self.emit(OpCode::Jump, &[0xFFFF]);
                self.loops.last_mut().expect("checked above").breaks.push(pos);
                Ok(())
            }
            Stmt::Continue { .. } => {
                if self.loops.is_empty() {
                    return Err(CompileError::ContinueOutsideLoop);
                }
                let pos = self.emit(OpCode::Jump, &[0xFFFF]);
                self.loops.last_mut().expect("checked above").continues.push(pos);
                Ok(())
            }
            Stmt::Import { path, .. } => self.compile_import(path),
            Stmt::MemberAssign { object, member, value, .. } => {
                self.compile_expr(object)?;
                let idx = self.add_constant(Value::string(member.clone()));
                self.emit(OpCode::Constant, &[idx as usize]);
                self.compile_expr(value)?;
                self.emit(OpCode::SetStructField, &[]);
                Ok(())
            }
        }
    }

    fn compile_while(&mut self, condition: &Expr, body: &Block) -> Result<(), CompileError> {
        let loop_start = self.current_scope().instructions.len();
        self.loops.push(LoopContext {
            start: loop_start,
            breaks: Vec::new(),
            continues: Vec::new(),
        });

        self.compile_expr(condition)?;
        let jnt_pos = self.emit(OpCode::JumpNotTruthy, &[0xFFFF]);

        self.compile_statements(body)?;
        self.strip_trailing_pop();
        self.emit(OpCode::Jump, &[loop_start]);

        let after_loop = self.current_scope().instructions.len();
        self.current_scope().change_operand(jnt_pos, after_loop);

        let ctx = self.loops.pop().expect("pushed at function start");
        for pos in ctx.breaks {
            self.current_scope().change_operand(pos, after_loop);
        }
        for pos in ctx.continues {
            self.current_scope().change_operand(pos, loop_start);
        }

        self.emit(OpCode::Null, &[]);
        Ok(())
    }

    fn compile_for(
        &mut self,
        init: &Option<Box<Stmt>>,
        condition: &Option<Expr>,
        increment: &Option<Box<Stmt>>,
        body: &Block,
    ) -> Result<(), CompileError> {
        if let Some(stmt) = init {
            self.compile_statement(stmt)?;
        }

        let loop_start = self.current_scope().instructions.len();
        self.loops.push(LoopContext {
            start: loop_start,
            breaks: Vec::new(),
            continues: Vec::new(),
        });

        let jnt_pos = match condition {
            Some(cond) => {
                self.compile_expr(cond)?;
                Some(self.emit(OpCode::JumpNotTruthy, &[0xFFFF]))
            }
            None => None,
        };

        self.compile_statements(body)?;
        self.strip_trailing_pop();

        // Continues re-enter at the increment, not at the condition check.
        let continue_target = self.current_scope().instructions.len();
        if let Some(stmt) = increment {
            self.compile_statement(stmt)?;
        }
        self.emit(OpCode::Jump, &[loop_start]);

        let after_loop = self.current_scope().instructions.len();
        if let Some(pos) = jnt_pos {
            self.current_scope().change_operand(pos, after_loop);
        }

        let ctx = self.loops.pop().expect("pushed at function start");
        for pos in ctx.breaks {
            self.current_scope().change_operand(pos, after_loop);
        }
        for pos in ctx.continues {
            self.current_scope().change_operand(pos, continue_target);
        }

        self.emit(OpCode::Null, &[]);
        Ok(())
    }

    fn compile_import(&mut self, path_expr: &Expr) -> Result<(), CompileError> {
        let path = match path_expr {
            Expr::StringLit { value, .. } => value.clone(),
            other => return Err(CompileError::InvalidImportPath(other.token().position())),
        };

        if self.imported.contains(&path) {
            return Ok(());
        }
        self.imported.insert(path.clone());

        let source = self
            .config
            .module_loader
            .load(&path)
            .map_err(CompileError::ModuleLoadError)?;
        let (program, errors) = parser::parse(&source);
        if !errors.is_empty() {
            return Err(CompileError::ModuleParseError(path, errors));
        }
        self.compile_statements(&program.statements)
    }

    // ---- expressions ----

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Integer { value, .. } => {
                let idx = self.add_constant(Value::Integer(*value));
                self.emit(OpCode::Constant, &[idx as usize]);
            }
            Expr::StringLit { value, .. } => {
                let idx = self.add_constant(Value::string(value.clone()));
                self.emit(OpCode::Constant, &[idx as usize]);
            }
            Expr::Boolean { value, .. } => {
                self.emit(if *value { OpCode::True } else { OpCode::False }, &[]);
            }
            Expr::Null { .. } => {
                self.emit(OpCode::Null, &[]);
            }
            Expr::Ident(ident) => {
                let symbol = self
                    .symbol_table
                    .resolve(&ident.value)
                    .ok_or_else(|| CompileError::UndefinedIdentifier(ident.value.clone()))?;
                self.load_symbol(&symbol);
            }
            Expr::Prefix { operator, right, .. } => {
                self.compile_expr(right)?;
                let opcode = match operator.as_str() {
                    "-" => OpCode::Minus,
                    "!" => OpCode::Bang,
                    "~" => OpCode::BitNot,
                    other => return Err(CompileError::UnknownOperator(other.to_string())),
                };
                self.emit(opcode, &[]);
            }
            Expr::Infix {
                operator,
                left,
                right,
                ..
            } => self.compile_infix(operator, left, right)?,
            Expr::If {
                condition,
                consequence,
                alternative,
                ..
            } => self.compile_if(condition, consequence, alternative)?,
            Expr::FunctionLiteral {
                name, params, body, ..
            } => self.compile_function_literal(name, params, body)?,
            Expr::Call { function, args, .. } => {
                self.compile_expr(function)?;
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.emit(OpCode::Call, &[args.len()]);
            }
            Expr::ArrayLit { elements, .. } => {
                for element in elements {
                    self.compile_expr(element)?;
                }
                self.emit(OpCode::Array, &[elements.len()]);
            }
            Expr::HashLit { pairs, .. } => {
                // Determinism (spec §8): sort by the key's source text.
                let mut ordered: Vec<&(Expr, Expr)> = pairs.iter().collect();
                ordered.sort_by(|(a, _), (b, _)| a.token().literal.cmp(&b.token().literal));
                for (key, value) in ordered {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                self.emit(OpCode::Hash, &[pairs.len()]);
            }
            Expr::Index { left, index, .. } => {
                self.compile_expr(left)?;
                self.compile_expr(index)?;
                self.emit(OpCode::Index, &[]);
            }
            Expr::StructLit { fields, .. } => {
                let mut ordered: Vec<&(String, Expr)> = fields.iter().collect();
                ordered.sort_by(|(a, _), (b, _)| a.cmp(b));
                for (name, value) in ordered {
                    let idx = self.add_constant(Value::string(name.clone()));
                    self.emit(OpCode::Constant, &[idx as usize]);
                    self.compile_expr(value)?;
                }
                self.emit(OpCode::Struct, &[fields.len()]);
            }
            Expr::Member { object, name, .. } => {
                self.compile_expr(object)?;
                let idx = self.add_constant(Value::string(name.clone()));
                self.emit(OpCode::Constant, &[idx as usize]);
                self.emit(OpCode::GetStructField, &[]);
            }
            Expr::EnumDef { name, variants, .. } => {
                let mut running = 0i64;
                let mut built = Vec::with_capacity(variants.len());
                for (variant_name, explicit) in variants {
                    let value = explicit.unwrap_or(running);
                    built.push((variant_name.clone(), value));
                    running = value + 1;
                }
                let enum_type = Value::EnumType(Rc::new(EnumType {
                    name: name.clone(),
                    variants: built,
                }));
                let idx = self.add_constant(enum_type);
                self.emit(OpCode::Constant, &[idx as usize]);
            }
        }
        Ok(())
    }

    fn compile_infix(&mut self, operator: &str, left: &Expr, right: &Expr) -> Result<(), CompileError> {
        match operator {
            // `a < b` / `a <= b` compile as reversed `>`/`>=` so the VM
            // implements only one comparison direction (spec §4.3, §9).
            "<" => {
                self.compile_expr(right)?;
                self.compile_expr(left)?;
                self.emit(OpCode::GreaterThan, &[]);
            }
            "<=" => {
                self.compile_expr(right)?;
                self.compile_expr(left)?;
                self.emit(OpCode::GreaterThanEqual, &[]);
            }
            "&&" => self.compile_and(left, right)?,
            "||" => self.compile_or(left, right)?,
            op => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                let opcode = match op {
                    "+" => OpCode::Add,
                    "-" => OpCode::Sub,
                    "*" => OpCode::Mul,
                    "/" => OpCode::Div,
                    "%" => OpCode::Mod,
                    "&" => OpCode::BitAnd,
                    "|" => OpCode::BitOr,
                    "^" => OpCode::BitXor,
                    "<<" => OpCode::LeftShift,
                    ">>" => OpCode::RightShift,
                    "==" => OpCode::Equal,
                    "!=" => OpCode::NotEqual,
                    ">" => OpCode::GreaterThan,
                    ">=" => OpCode::GreaterThanEqual,
                    other => return Err(CompileError::UnknownOperator(other.to_string())),
                };
                self.emit(opcode, &[]);
            }
        }
        Ok(())
    }

    /// `a && b`: short-circuit to `False` without evaluating `b` when
    /// `a` is falsy (spec §4.3).
    fn compile_and(&mut self, left: &Expr, right: &Expr) -> Result<(), CompileError> {
        self.compile_expr(left)?;
        let jnt_pos = self.emit(OpCode::JumpNotTruthy, &[0xFFFF]);
        self.compile_expr(right)?;
        let jmp_pos = self.emit(OpCode::Jump, &[0xFFFF]);

        let false_pos = self.current_scope().instructions.len();
        self.current_scope().change_operand(jnt_pos, false_pos);
        self.emit(OpCode::False, &[]);

        let end_pos = self.current_scope().instructions.len();
        self.current_scope().change_operand(jmp_pos, end_pos);
        Ok(())
    }

    /// `a || b`: short-circuit to `True` without evaluating `b` when
    /// `a` is truthy (spec §4.3).
    fn compile_or(&mut self, left: &Expr, right: &Expr) -> Result<(), CompileError> {
        self.compile_expr(left)?;
        let jnt_pos = self.emit(OpCode::JumpNotTruthy, &[0xFFFF]);
        self.emit(OpCode::True, &[]);
        let jmp_pos = self.emit(OpCode::Jump, &[0xFFFF]);

        let right_pos = self.current_scope().instructions.len();
        self.current_scope().change_operand(jnt_pos, right_pos);
        self.compile_expr(right)?;

        let end_pos = self.current_scope().instructions.len();
        self.current_scope().change_operand(jmp_pos, end_pos);
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expr,
        consequence: &Block,
        alternative: &Option<Block>,
    ) -> Result<(), CompileError> {
        self.compile_expr(condition)?;
        let jnt_pos = self.emit(OpCode::JumpNotTruthy, &[0xFFFF]);

        self.compile_statements(consequence)?;
        if self.current_scope().last_instruction_is(OpCode::Pop) {
            self.remove_last_pop();
        } else {
            self.emit(OpCode::Null, &[]);
        }
        let jmp_pos = self.emit(OpCode::Jump, &[0xFFFF]);

        let alt_pos = self.current_scope().instructions.len();
        self.current_scope().change_operand(jnt_pos, alt_pos);

        match alternative {
            None => {
                self.emit(OpCode::Null, &[]);
            }
            Some(alt) => {
                self.compile_statements(alt)?;
                if self.current_scope().last_instruction_is(OpCode::Pop) {
                    self.remove_last_pop();
                } else {
                    self.emit(OpCode::Null, &[]);
                }
            }
        }

        let end_pos = self.current_scope().instructions.len();
        self.current_scope().change_operand(jmp_pos, end_pos);
        Ok(())
    }

    fn compile_function_literal(
        &mut self,
        name: &Option<String>,
        params: &[Param],
        body: &Block,
    ) -> Result<(), CompileError> {
        self.enter_scope();

        if let Some(fn_name) = name {
            self.symbol_table.define_function_name(fn_name);
        }
        for param in params {
            self.symbol_table.define(&param.name, param.type_annotation.clone());
        }

        self.compile_statements(body)?;

        if self.current_scope().last_instruction_is(OpCode::Pop) {
            self.current_scope().replace_last_opcode(OpCode::ReturnValue);
        } else if !self.current_scope().last_instruction_is(OpCode::ReturnValue) {
            self.emit(OpCode::Return, &[]);
        }

        let free_symbols = self.symbol_table.free_symbols.clone();
        let num_locals = self.symbol_table.num_definitions;
        let instructions = self.leave_scope();

        for symbol in &free_symbols {
            self.load_symbol(symbol);
        }

        let compiled_fn = Value::CompiledFunction(Rc::new(CompiledFunction {
            instructions,
            num_locals,
            num_parameters: params.len(),
        }));
        let fn_index = self.add_constant(compiled_fn);
        self.emit(OpCode::Closure, &[fn_index as usize, free_symbols.len()]);
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// `lex → parse → compile`, the external surface of spec §6.6.
pub fn compile(source: &str) -> Result<Bytecode, String> {
    let (program, errors) = parser::parse(source);
    if !errors.is_empty() {
        return Err(errors.join("; "));
    }
    let mut compiler = Compiler::new();
    compiler.compile(&program).map_err(|e| e.to_string())?;
    Ok(compiler.bytecode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bhasa_core::disassemble;

    fn compiled(source: &str) -> Bytecode {
        compile(source).unwrap_or_else(|e| panic!("compile error for {source:?}: {e}"))
    }

    #[test]
    fn compiles_arithmetic_precedence() {
        let bc = compiled("2 + 3 * 4;");
        assert_eq!(
            disassemble(&bc.instructions),
            "0000 Constant 0\n0003 Constant 1\n0006 Constant 2\n0009 Mul\n0010 Add\n0011 Pop\n"
        );
    }

    #[test]
    fn less_than_is_compiled_as_reversed_greater_than() {
        let bc = compiled("1 < 2;");
        assert_eq!(
            disassemble(&bc.instructions),
            "0000 Constant 0\n0003 Constant 1\n0006 GreaterThan\n0007 Pop\n"
        );
    }

    #[test]
    fn global_let_emits_set_global() {
        let bc = compiled("ধরি x = 5;");
        assert!(disassemble(&bc.instructions).contains("SetGlobal 0"));
    }

    #[test]
    fn undefined_identifier_is_a_compile_error() {
        assert!(compile("x;").is_err());
    }

    #[test]
    fn break_outside_loop_is_a_compile_error() {
        assert!(compile("বিরতি;").is_err());
    }

    #[test]
    fn hash_literal_keys_compile_in_sorted_order() {
        let bc = compiled(r#"{"b": 1, "a": 2};"#);
        // "a" (ascii 0x61) sorts before "b" (0x62): key "a" must be the
        // first Constant pushed even though it was written second.
        match &bc.constants[..] {
            [Value::Str(first), ..] => assert_eq!(first.as_ref(), "a"),
            other => panic!("expected a leading string constant, got {other:?}"),
        }
    }

    #[test]
    fn determinism_same_source_compiles_to_identical_bytes() {
        let a = compiled("ধরি f = ফাংশন(n){ফেরত n + 1;}; f(41);");
        let b = compiled("ধরি f = ফাংশন(n){ফেরত n + 1;}; f(41);");
        assert_eq!(a.instructions, b.instructions);
    }

    #[test]
    fn jump_placeholders_are_all_patched() {
        let bc = compiled("যদি(সত্য){1;}নাহলে{2;}");
        // No 0xFFFF placeholder bytes should remain once compilation succeeds.
        let text = disassemble(&bc.instructions);
        assert!(!text.contains("65535"));
    }

    #[test]
    fn closure_captures_free_variable() {
        let bc = compiled(
            "ধরি m = ফাংশন(){ধরি c = 0; ফাংশন(){c = c + 1; c}}; m();",
        );
        assert!(disassemble(&bc.instructions).contains("Closure"));
    }

    /// A `ModuleLoader` that always hands back the same fixed source,
    /// regardless of path, so import idempotency can be tested without
    /// touching the filesystem.
    struct FixedModuleLoader(&'static str);

    impl crate::modules::ModuleLoader for FixedModuleLoader {
        fn load(&self, _path: &str) -> Result<String, String> {
            Ok(self.0.to_string())
        }
    }

    fn compile_with_loader(source: &str, loader: FixedModuleLoader) -> Bytecode {
        let config = CompilerConfig::new().with_module_loader(loader);
        let (program, errors) = parser::parse(source);
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        let mut compiler = Compiler::with_config(config);
        compiler
            .compile(&program)
            .unwrap_or_else(|e| panic!("compile error for {source:?}: {e}"));
        compiler.bytecode()
    }

    #[test]
    fn idempotent_import_produces_identical_bytecode_to_importing_once() {
        // spec §8: "Importing the same module path twice in one
        // compilation produces bytecode identical to importing it once."
        let module_source = "ধরি g = 7;";

        let once = compile_with_loader(
            r#"অন্তর্ভুক্ত "mod"; g;"#,
            FixedModuleLoader(module_source),
        );
        let twice = compile_with_loader(
            r#"অন্তর্ভুক্ত "mod"; অন্তর্ভুক্ত "mod"; g;"#,
            FixedModuleLoader(module_source),
        );

        assert_eq!(once.instructions, twice.instructions);
        assert_eq!(once.constants, twice.constants);
    }
}
