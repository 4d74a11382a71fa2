//! End-to-end tests: compile NNP source, execute the stream, check the
//! console output.

use std::io::Cursor;

use nilnovi::{Error, Program, Vm, compile};
use pretty_assertions::assert_eq;

/// Compile and run with the given stdin bytes, returning stdout as text.
fn run_with_input(source: &str, input: &[u8]) -> String {
    let compilation = compile(source).expect("compilation should succeed");
    let mut output = Vec::new();
    let mut vm = Vm::with_io(compilation.program, Cursor::new(input.to_vec()), &mut output);
    vm.run().expect("execution should succeed");
    String::from_utf8(output).expect("output should be UTF-8")
}

fn run(source: &str) -> String {
    run_with_input(source, b"")
}

#[test]
fn prints_a_literal() {
    assert_eq!(run("procedure main is begin put(42); end"), "42\n");
}

#[test]
fn evaluates_arithmetic_with_precedence() {
    assert_eq!(run("procedure main is begin put(2+3*4); end"), "14\n");
}

#[test]
fn while_loop_counts() {
    let source = "procedure main is i : integer; begin i := 0; \
                  while i < 3 loop put(i); i := i+1; end; end";
    assert_eq!(run(source), "0\n1\n2\n");
}

#[test]
fn if_else_takes_the_true_branch() {
    let source = "procedure main is begin if 1 < 2 then put(1); else put(0); end; end";
    assert_eq!(run(source), "1\n");
}

#[test]
fn if_else_takes_the_false_branch() {
    let source = "procedure main is begin if 2 < 1 then put(1); else put(0); end; end";
    assert_eq!(run(source), "0\n");
}

#[test]
fn in_out_parameter_updates_the_caller() {
    let source = "procedure inc(x : in out integer) is begin x := x+1; end; \
                  procedure main is i : integer; begin i := 5; inc(i); put(i); end";
    assert_eq!(run(source), "6\n");
}

#[test]
fn function_return_value_reaches_the_caller() {
    let source = "function sq(n : in integer) return integer is begin return n*n; end; \
                  procedure main is begin put(sq(7)); end";
    assert_eq!(run(source), "49\n");
}

#[test]
fn division_by_zero_fails() {
    let compilation = compile("procedure main is begin put(1/0); end").unwrap();
    let mut output = Vec::new();
    let mut vm = Vm::with_io(compilation.program, std::io::empty(), &mut output);
    assert!(matches!(vm.run(), Err(Error::DivisionByZero)));
}

#[test]
fn get_feeds_a_variable() {
    let source = "procedure main is x : integer; begin get(x); put(x*2); end";
    assert_eq!(run_with_input(source, b"21\n"), "42\n");
}

#[test]
fn nested_loops_iterate_in_row_order() {
    let source = "procedure main is i, j : integer; begin \
                  i := 0; \
                  while i < 2 loop \
                    j := 0; \
                    while j < 2 loop put(i*2 + j); j := j+1; end; \
                    i := i+1; \
                  end; end";
    assert_eq!(run(source), "0\n1\n2\n3\n");
}

#[test]
fn nested_if_inside_else_branch() {
    let source = "procedure main is begin \
                  if 2 < 1 then put(9); \
                  else if true then put(1); else put(0); end; \
                  end; end";
    assert_eq!(run(source), "1\n");
}

#[test]
fn loop_in_the_main_body_of_a_program_with_callables() {
    // Branch targets must account for the jump emitted over the callable
    // bodies.
    let source = "function sq(n : in integer) return integer is begin return n*n; end; \
                  procedure main is i : integer; begin \
                  i := 0; while i < 3 loop put(sq(i)); i := i+1; end; end";
    assert_eq!(run(source), "0\n1\n4\n");
}

#[test]
fn boolean_expressions_drive_control_flow() {
    let source = "procedure main is begin \
                  if true and not false then put(1); end; \
                  if 1 = 2 or 3 /= 4 then put(2); end; \
                  if 2 >= 2 and 2 <= 3 then put(3); end; \
                  end";
    assert_eq!(run(source), "1\n2\n3\n");
}

#[test]
fn function_calls_inside_expressions_compose() {
    let source = "function double(n : in integer) return integer is begin return n+n; end; \
                  procedure main is begin put(double(3) + double(4)); end";
    assert_eq!(run(source), "14\n");
}

#[test]
fn recursive_function_executes() {
    let source = "function fact(n : in integer) return integer is begin \
                  if n < 2 then return 1; \
                  else return n * fact(n - 1); end; end; \
                  procedure main is begin put(fact(5)); end";
    assert_eq!(run(source), "120\n");
}

#[test]
fn executing_a_reloaded_stream_matches_direct_execution() {
    let source = "procedure main is i : integer; begin i := 0; \
                  while i < 3 loop put(i); i := i+1; end; end";
    let program = compile(source).unwrap().program;
    let reloaded = Program::parse(&program.serialize()).unwrap();

    let mut direct = Vec::new();
    Vm::with_io(program, std::io::empty(), &mut direct).run().unwrap();
    let mut indirect = Vec::new();
    Vm::with_io(reloaded, std::io::empty(), &mut indirect).run().unwrap();
    assert_eq!(direct, indirect);
    assert_eq!(direct, b"0\n1\n2\n");
}
