//! Bhasa REPL
//!
//! Line-at-a-time REPL: each input line is parsed and compiled into the
//! running `Compiler`'s global scope, then run against a `Vm` that
//! carries its globals across lines (SPEC_FULL §2, §6 REPL; teacher's
//! `Compiler::new_with_state`/`take_state` pattern).
//!
//! Commands:
//!   :quit, :q   exit
//!   :help       show this help

use bhasa_compiler::{parser, CompileError, Compiler};
use bhasa_runtime::{Bytecode, Value, Vm};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = ">> ";
const HELP: &str = "Commands:\n  :quit, :q   exit\n  :help       show this help";
const GLOBALS_SIZE: usize = 65536;

fn main() {
    println!("Bhasa {} REPL", env!("CARGO_PKG_VERSION"));
    println!("{HELP}");

    let mut rl = DefaultEditor::new().unwrap_or_else(|e| {
        eprintln!("Failed to start line editor: {e}");
        std::process::exit(1);
    });

    let mut compiler = Compiler::new();
    let mut globals = vec![Value::Null; GLOBALS_SIZE];

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match trimmed {
                    ":quit" | ":q" => break,
                    ":help" => {
                        println!("{HELP}");
                        continue;
                    }
                    _ => {}
                }

                let (program, parse_errors) = parser::parse(&line);
                if !parse_errors.is_empty() {
                    for err in &parse_errors {
                        eprintln!("parse error: {err}");
                    }
                    continue;
                }

                if let Err(e) = compiler.compile(&program) {
                    report_compile_error(&e);
                    continue;
                }

                let line_bytecode = compiler.bytecode();
                let (symbol_table, constants) = compiler.take_state();

                let mut vm = Vm::with_globals(
                    Bytecode {
                        instructions: line_bytecode.instructions,
                        constants: constants.clone(),
                    },
                    globals,
                );
                match vm.run() {
                    Ok(()) => {
                        if let Some(value) = vm.last_popped_stack_element() {
                            println!("{value}");
                        }
                    }
                    Err(e) => eprintln!("runtime error: {e}"),
                }

                globals = vm.globals;
                compiler = Compiler::new_with_state(symbol_table, constants);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }
}

fn report_compile_error(e: &CompileError) {
    eprintln!("compile error: {e}");
}
