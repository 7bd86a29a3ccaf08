//! End-to-end lex → parse → compile → run scenarios (spec §8).

use bhasa_compiler::compile;
use bhasa_runtime::{Value, Vm};

fn run(source: &str) -> Value {
    let bytecode = compile(source).unwrap_or_else(|e| panic!("compile error: {e}"));
    let mut vm = Vm::new(bytecode);
    vm.run().unwrap_or_else(|e| panic!("runtime error: {e}"));
    vm.last_popped_stack_element()
        .cloned()
        .expect("at least one expression statement ran")
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(run("2 + 3 * 4;"), Value::Integer(14));
}

#[test]
fn bengali_digits() {
    assert_eq!(run("ধরি x = ১২৩; x + 1;"), Value::Integer(124));
}

#[test]
fn closure_counter() {
    let source = "ধরি m = ফাংশন(){ধরি c = 0; ফাংশন(){c = c + 1; c}}; \
                  ধরি k = m(); k(); k(); k();";
    assert_eq!(run(source), Value::Integer(3));
}

#[test]
fn recursion_fibonacci() {
    let source = "ধরি f = ফাংশন(n){যদি(n<2){ফেরত n;} ফেরত f(n-1)+f(n-2);}; f(10);";
    assert_eq!(run(source), Value::Integer(55));
}

#[test]
fn hash_round_trip() {
    assert_eq!(
        run(r#"ধরি h = {"a": 1, "b": 2}; h["a"] + h["b"];"#),
        Value::Integer(3)
    );
}

#[test]
fn hash_literal_bytecode_is_deterministic() {
    let a = compile(r#"{"b": 1, "a": 2};"#).unwrap();
    let b = compile(r#"{"b": 1, "a": 2};"#).unwrap();
    assert_eq!(a.instructions, b.instructions);
    assert_eq!(a.constants, b.constants);
}

#[test]
fn loop_with_break() {
    let source = "ধরি s = 0; পর্যন্ত (ধরি i=0; i<10; i=i+1){ যদি(i==5){বিরতি;} s = s+i; } s;";
    assert_eq!(run(source), Value::Integer(10));
}
