//! Error types shared by the compiler and the virtual machine.
//!
//! The toolchain is fail-fast: the first error aborts compilation or
//! execution with a single diagnostic. Compile-time variants carry the
//! source position of the offending token.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Unrecognized character in the source text.
    #[error("lexical error at {line}:{column}: {message}")]
    Lexical {
        line: usize,
        column: usize,
        message: String,
    },

    /// Unexpected or missing token.
    #[error("parse error at {line}:{column}: expected {expected}, found {found}")]
    Parse {
        line: usize,
        column: usize,
        expected: String,
        found: String,
    },

    /// Undeclared identifier or duplicate declaration.
    #[error("name error at {line}:{column}: {message}")]
    Name {
        line: usize,
        column: usize,
        message: String,
    },

    /// Assignment to a callable, write to an in-only parameter, arity
    /// mismatch, and the like.
    #[error("semantic error at {line}:{column}: {message}")]
    Semantic {
        line: usize,
        column: usize,
        message: String,
    },

    /// Fault while loading or executing an instruction stream.
    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
