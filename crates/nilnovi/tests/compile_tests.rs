//! Compilation tests: exact instruction streams for representative programs
//! and structural properties of the generated code.

use nilnovi::{Op, Program, compile};
use pretty_assertions::assert_eq;

fn compile_to_text(source: &str) -> String {
    compile(source).expect("compilation should succeed").program.serialize()
}

#[test]
fn put_literal() {
    assert_eq!(
        compile_to_text("procedure main is begin put(42); end"),
        "debutProg()\n\
         empiler(42)\n\
         put()\n\
         finProg()\n"
    );
}

#[test]
fn arithmetic_precedence() {
    assert_eq!(
        compile_to_text("procedure main is begin put(2+3*4); end"),
        "debutProg()\n\
         empiler(2)\n\
         empiler(3)\n\
         empiler(4)\n\
         mult()\n\
         add()\n\
         put()\n\
         finProg()\n"
    );
}

#[test]
fn while_loop_branches() {
    let source = "procedure main is i : integer; begin i := 0; \
                  while i < 3 loop put(i); i := i+1; end; end";
    assert_eq!(
        compile_to_text(source),
        "debutProg()\n\
         reserver(1)\n\
         empilerAd(0)\n\
         empiler(0)\n\
         affectation()\n\
         empilerAd(0)\n\
         valeurPile()\n\
         empiler(3)\n\
         inf()\n\
         tze(21)\n\
         empilerAd(0)\n\
         valeurPile()\n\
         put()\n\
         empilerAd(0)\n\
         empilerAd(0)\n\
         valeurPile()\n\
         empiler(1)\n\
         add()\n\
         affectation()\n\
         tra(6)\n\
         finProg()\n"
    );
}

#[test]
fn if_else_branches() {
    let source = "procedure main is begin if 1 < 2 then put(1); else put(0); end; end";
    assert_eq!(
        compile_to_text(source),
        "debutProg()\n\
         empiler(1)\n\
         empiler(2)\n\
         inf()\n\
         tze(9)\n\
         empiler(1)\n\
         put()\n\
         tra(11)\n\
         empiler(0)\n\
         put()\n\
         finProg()\n"
    );
}

#[test]
fn if_without_else_falls_through() {
    let source = "procedure main is begin if 1 < 2 then put(1); end; end";
    assert_eq!(
        compile_to_text(source),
        "debutProg()\n\
         empiler(1)\n\
         empiler(2)\n\
         inf()\n\
         tze(8)\n\
         empiler(1)\n\
         put()\n\
         finProg()\n"
    );
}

#[test]
fn procedure_with_in_out_parameter() {
    let source = "procedure inc(x : in out integer) is begin x := x+1; end; \
                  procedure main is i : integer; begin i := 5; inc(i); put(i); end";
    assert_eq!(
        compile_to_text(source),
        "debutProg()\n\
         tra(10)\n\
         empilerParam(0)\n\
         empilerParam(0)\n\
         valeurPile()\n\
         empiler(1)\n\
         add()\n\
         affectation()\n\
         retourProc()\n\
         reserver(1)\n\
         empilerAd(0)\n\
         empiler(5)\n\
         affectation()\n\
         reserverBloc()\n\
         empilerAd(0)\n\
         traStat(3,1)\n\
         empilerAd(0)\n\
         valeurPile()\n\
         put()\n\
         finProg()\n"
    );
}

#[test]
fn function_call_as_value() {
    let source = "function sq(n : in integer) return integer is begin return n*n; end; \
                  procedure main is begin put(sq(7)); end";
    assert_eq!(
        compile_to_text(source),
        "debutProg()\n\
         tra(9)\n\
         empilerAd(0)\n\
         valeurPile()\n\
         empilerAd(0)\n\
         valeurPile()\n\
         mult()\n\
         retourFonct()\n\
         reserverBloc()\n\
         empiler(7)\n\
         traStat(3,1)\n\
         put()\n\
         finProg()\n"
    );
}

#[test]
fn leading_and_nested_declarations_compile_identically() {
    let leading = "procedure inc(x : in out integer) is begin x := x+1; end; \
                   procedure main is i : integer; begin i := 5; inc(i); put(i); end";
    let nested = "procedure main is \
                  procedure inc(x : in out integer) is begin x := x+1; end; \
                  i : integer; \
                  begin i := 5; inc(i); put(i); end";
    assert_eq!(compile_to_text(leading), compile_to_text(nested));
}

#[test]
fn boolean_operators_and_unary() {
    assert_eq!(
        compile_to_text("procedure main is begin put(not (true and false) or 1 = 2); end"),
        "debutProg()\n\
         empiler(1)\n\
         empiler(0)\n\
         et()\n\
         non()\n\
         empiler(1)\n\
         empiler(2)\n\
         egal()\n\
         ou()\n\
         put()\n\
         finProg()\n"
    );
}

#[test]
fn unary_minus_and_plus() {
    assert_eq!(
        compile_to_text("procedure main is begin put(-3 + +4); end"),
        "debutProg()\n\
         empiler(3)\n\
         moins()\n\
         empiler(4)\n\
         add()\n\
         put()\n\
         finProg()\n"
    );
}

#[test]
fn get_reads_into_a_variable_address() {
    assert_eq!(
        compile_to_text("procedure main is x : integer; begin get(x); put(x); end"),
        "debutProg()\n\
         reserver(1)\n\
         empilerAd(0)\n\
         get()\n\
         empilerAd(0)\n\
         valeurPile()\n\
         put()\n\
         finProg()\n"
    );
}

#[test]
fn multi_variable_declaration_reserves_once() {
    let text = compile_to_text(
        "procedure main is a, b, c : integer; begin a := 1; end",
    );
    assert!(text.contains("reserver(3)\n"), "{text}");
}

#[test]
fn in_parameters_pass_by_value_and_in_out_by_reference() {
    let source = "procedure mix(a : in integer; b : in out integer) is begin b := a; end; \
                  procedure main is i : integer; begin mix(4, i); end";
    let text = compile_to_text(source);
    // First actual: a literal value. Second actual: an undereferenced
    // address for the in-out formal.
    assert!(
        text.contains(
            "reserverBloc()\n\
             empiler(4)\n\
             empilerAd(0)\n\
             traStat(3,2)\n"
        ),
        "{text}"
    );
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

const PROGRAMS: &[&str] = &[
    "procedure main is begin put(42); end",
    "procedure main is i : integer; begin i := 0; while i < 3 loop put(i); i := i+1; end; end",
    "procedure main is begin if 1 < 2 then put(1); else put(0); end; end",
    "procedure inc(x : in out integer) is begin x := x+1; end; \
     procedure main is i : integer; begin i := 5; inc(i); put(i); end",
    "function sq(n : in integer) return integer is begin return n*n; end; \
     procedure main is begin put(sq(7)); end",
    "procedure main is i, j : integer; begin \
     i := 0; while i < 2 loop j := 0; while j < 2 loop put(i*2 + j); j := j+1; end; i := i+1; end; end",
    "procedure main is begin if true then if false then put(0); else put(1); end; end; end",
];

#[test]
fn serialized_streams_parse_back_identically() {
    for source in PROGRAMS {
        let program = compile(source).unwrap().program;
        let reloaded = Program::parse(&program.serialize()).unwrap();
        assert_eq!(program, reloaded, "source: {source}");
    }
}

#[test]
fn branch_targets_stay_inside_the_program() {
    for source in PROGRAMS {
        let program = compile(source).unwrap().program;
        let len = program.len();
        for (index, op) in program.iter().enumerate() {
            let target = match *op {
                Op::Tra(t) | Op::Tze(t) | Op::TraStat(t, _) => t,
                _ => continue,
            };
            assert!(
                (1..=len).contains(&target),
                "instruction {} of {source}: target {target} outside 1..={len}",
                index + 1
            );
        }
    }
}

#[test]
fn streams_start_with_debut_prog_and_end_with_fin_prog() {
    for source in PROGRAMS {
        let program = compile(source).unwrap().program;
        assert_eq!(program.fetch(1), Some(Op::DebutProg), "source: {source}");
        assert_eq!(program.fetch(program.len()), Some(Op::FinProg), "source: {source}");
    }
}
