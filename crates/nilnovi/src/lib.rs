//! NilNovi — a compiler and stack virtual machine for the NNP teaching
//! language.
//!
//! NNP is a small Pascal-family language: nested procedures and functions,
//! typed `in` / `in out` parameters, integers and booleans, `while` loops,
//! `if`/`else`, `return`, and console I/O through `get` and `put`. This
//! crate implements the full toolchain as two stages that communicate only
//! through a textual instruction format:
//!
//! 1. **Compilation** — [`compile`] runs the lexer and the recursive-descent
//!    parser/code generator, producing a [`Program`] (the instruction
//!    stream) and the final [`IdentifierTable`].
//! 2. **Execution** — [`Vm`] interprets a [`Program`] against a contiguous
//!    value stack with `base`/`co` registers, reading `get` input and
//!    writing `put` output through injected handles.
//!
//! # Quick start
//!
//! ```
//! use nilnovi::Vm;
//!
//! let source = "procedure main is begin put(40 + 2); end";
//! let compilation = nilnovi::compile(source).unwrap();
//!
//! let mut output = Vec::new();
//! let mut vm = Vm::with_io(compilation.program, std::io::empty(), &mut output);
//! vm.run().unwrap();
//! assert_eq!(output, b"42\n");
//! ```
//!
//! # Wire format
//!
//! A compiled program serializes one instruction per line as
//! `opname(p1,p2)` — e.g. `empiler(42)`, `traStat(3,1)`, `put()` — and
//! [`Program::parse`] loads the same format back. Instruction addresses are
//! 1-based; branch operands target them directly.
//!
//! # Errors
//!
//! Both stages are fail-fast: the first lexical, parse, name, semantic, or
//! runtime fault aborts with a single [`Error`] carrying the source position
//! (compile time) or a description of the machine fault (run time). The VM
//! halts cleanly through [`Status::Halted`]; it never exits the process.

mod bytecode;
mod compiler;
mod error;
mod lexer;
mod table;
mod token;
mod vm;

pub use bytecode::{Op, Program};
pub use compiler::{Compilation, Compiler, compile};
pub use error::{Error, Result};
pub use lexer::{Lexer, TokenStream};
pub use table::{CallableEntry, CallableKind, Entry, EntryId, IdentifierTable, Type, VariableEntry};
pub use token::{Keyword, Symbol, Token, TokenKind};
pub use vm::{Status, Vm};
